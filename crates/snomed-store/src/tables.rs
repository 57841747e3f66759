//! Table definitions for the embedded key-value store.
//!
//! Component records are bincode-encoded under their identifier; the
//! remaining tables are composite-key indices whose ordered keys make
//! prefix range scans serve as reverse lookups. Refset member UUIDs are
//! keyed by their `u128` representation.

use redb::TableDefinition;

/// `conceptId -> Concept`
pub const CONCEPTS: TableDefinition<u64, &[u8]> = TableDefinition::new("concepts");

/// `descriptionId -> Description`
pub const DESCRIPTIONS: TableDefinition<u64, &[u8]> = TableDefinition::new("descriptions");

/// `relationshipId -> Relationship`
pub const RELATIONSHIPS: TableDefinition<u64, &[u8]> = TableDefinition::new("relationships");

/// `relationshipId -> ConcreteRelationship`
pub const CONCRETE_RELATIONSHIPS: TableDefinition<u64, &[u8]> =
    TableDefinition::new("concrete-relationships");

/// `uuid -> RefsetItem`
pub const REFSET_ITEMS: TableDefinition<u128, &[u8]> = TableDefinition::new("refset-items");

/// `(conceptId, descriptionId)` — descriptions of a concept.
pub const CONCEPT_DESCRIPTIONS: TableDefinition<(u64, u64), ()> =
    TableDefinition::new("concept-descriptions");

/// `(sourceId, typeId, destinationId)` — active outbound relationships.
pub const PARENTS: TableDefinition<(u64, u64, u64), ()> = TableDefinition::new("parents");

/// `(destinationId, typeId, sourceId)` — active inbound relationships.
pub const CHILDREN: TableDefinition<(u64, u64, u64), ()> = TableDefinition::new("children");

/// `(sourceId, relationshipId)` — concrete values of a concept.
pub const CONCEPT_CONCRETE: TableDefinition<(u64, u64), ()> =
    TableDefinition::new("concept-concrete");

/// `(referencedComponentId, refsetId, uuid)` — refset items of a component.
pub const COMPONENT_REFSETS: TableDefinition<(u64, u64, u128), ()> =
    TableDefinition::new("component-refsets");

/// `(refsetId, referencedComponentId, uuid)` — items of a refset.
pub const REFSET_MEMBERS: TableDefinition<(u64, u64, u128), ()> =
    TableDefinition::new("refset-members");

/// `refsetId` — refsets with at least one ingested item.
pub const INSTALLED_REFSETS: TableDefinition<u64, ()> = TableDefinition::new("installed-refsets");

/// `(conceptId, ancestorId)` — transitive IS_A closure, self excluded.
pub const ANCESTORS: TableDefinition<(u64, u64), ()> = TableDefinition::new("ancestors");

/// `(refsetId, mapTarget, uuid)` — reverse lookup for map refsets.
pub const MAP_TARGETS: TableDefinition<(u64, &str, u128), ()> =
    TableDefinition::new("map-targets");

/// `typeId` — distinct relationship types seen during ingestion.
pub const RELATIONSHIP_TYPES: TableDefinition<u64, ()> =
    TableDefinition::new("relationship-types");

/// `typeId -> 1` while every value of the type parsed as a number,
/// `0` once a non-numeric value was seen.
pub const CONCRETE_TYPES: TableDefinition<u64, u8> = TableDefinition::new("concrete-types");

/// All tables, opened once at database creation so later read
/// transactions never observe a missing table.
pub(crate) fn create_all(txn: &redb::WriteTransaction) -> Result<(), redb::TableError> {
    txn.open_table(CONCEPTS)?;
    txn.open_table(DESCRIPTIONS)?;
    txn.open_table(RELATIONSHIPS)?;
    txn.open_table(CONCRETE_RELATIONSHIPS)?;
    txn.open_table(REFSET_ITEMS)?;
    txn.open_table(CONCEPT_DESCRIPTIONS)?;
    txn.open_table(PARENTS)?;
    txn.open_table(CHILDREN)?;
    txn.open_table(CONCEPT_CONCRETE)?;
    txn.open_table(COMPONENT_REFSETS)?;
    txn.open_table(REFSET_MEMBERS)?;
    txn.open_table(INSTALLED_REFSETS)?;
    txn.open_table(ANCESTORS)?;
    txn.open_table(MAP_TARGETS)?;
    txn.open_table(RELATIONSHIP_TYPES)?;
    txn.open_table(CONCRETE_TYPES)?;
    Ok(())
}
