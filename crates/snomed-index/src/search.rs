//! Free-text search over description documents.
//!
//! Two modes share the same filter stack. Autocomplete tokenizes the
//! input, requires every token to match (as a prefix, exact term or
//! fuzzy term) and boosts scores by the inverse square root of the term
//! length, so short exact-ish names surface first. Ranked mode ORs the
//! token queries without the length boost, ranking best-match even when
//! some tokens are absent.

use snomed_store::SnomedStore;
use snomed_types::{DescriptionType, SctId};
use tantivy::collector::TopDocs;
use tantivy::query::{BooleanQuery, FuzzyTermQuery, Occur, Query, TermQuery, TermSetQuery};
use tantivy::schema::{IndexRecordOption, Value as _};
use tantivy::{DocAddress, DocId, Score, SegmentReader, TantivyDocument, Term};
use tracing::debug;

use crate::ecl::{EclEvaluator, EclExpression};
use crate::error::QueryResult;
use crate::query::Queries;
use crate::schema::{FOLDING_TOKENIZER, LENGTH_BOOST};
use crate::SearchIndex;

/// Search mode, see the module documentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchMode {
    /// Token-AND with prefix matching and length boost.
    #[default]
    Autocomplete,
    /// Token-OR without length boost.
    Ranked,
}

/// A search request.
#[derive(Debug, Clone, Default)]
pub struct SearchRequest {
    /// The search string. Empty means "filters only".
    pub s: String,
    /// Optional ECL constraint restricting the concept set.
    pub constraint: Option<EclExpression>,
    /// Fuzzy edit distance applied to every token (0 = off, max 2).
    pub fuzzy: u8,
    /// Fuzzy distance to retry with when the primary search is empty
    /// and `fuzzy` was 0.
    pub fallback_fuzzy: u8,
    /// Maximum hits to return.
    pub max_hits: usize,
    /// Required attribute values, `(typeId, conceptId)` pairs matched
    /// against the transitive attribute fields.
    pub properties: Vec<(SctId, SctId)>,
    /// Restrict to concepts that are members of any of these refsets.
    pub concept_refsets: Vec<SctId>,
    /// Include descriptions of inactive concepts.
    pub include_inactive_concepts: bool,
    /// Include inactive descriptions.
    pub include_inactive_descriptions: bool,
    /// Include fully specified names.
    pub include_fsn: bool,
    /// Collapse hits sharing a concept and case-folded term.
    pub remove_duplicates: bool,
    /// Language refset priority for preferred-term resolution.
    pub language_refsets: Vec<SctId>,
    /// Autocomplete or ranked.
    pub mode: SearchMode,
}

/// One search hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    /// Description id.
    pub id: u64,
    /// Concept id.
    pub concept_id: SctId,
    /// The matched description's term.
    pub term: String,
    /// Preferred synonym of the concept in the caller's locale.
    pub preferred_term: Option<String>,
}

impl SearchIndex {
    /// Runs a search request.
    ///
    /// When the primary search returns nothing, `fuzzy` is 0 and
    /// `fallback_fuzzy` is positive, the search is retried once at the
    /// fallback distance.
    pub fn search(&self, store: &SnomedStore, request: &SearchRequest) -> QueryResult<Vec<SearchHit>> {
        let hits = self.search_once(store, request, request.fuzzy)?;
        if hits.is_empty() && request.fuzzy == 0 && request.fallback_fuzzy > 0 {
            debug!(s = %request.s, "retrying search with fallback fuzziness");
            return self.search_once(store, request, request.fallback_fuzzy);
        }
        Ok(hits)
    }

    fn search_once(
        &self,
        store: &SnomedStore,
        request: &SearchRequest,
        fuzzy: u8,
    ) -> QueryResult<Vec<SearchHit>> {
        let query = self.build_query(store, request, fuzzy)?;
        let searcher = self.reader.searcher();
        let max_hits = request.max_hits.max(1);

        let addresses: Vec<DocAddress> = match request.mode {
            SearchMode::Autocomplete => {
                let collector =
                    TopDocs::with_limit(max_hits).tweak_score(length_boost_scorer);
                searcher
                    .search(&query, &collector)?
                    .into_iter()
                    .map(|(_score, address)| address)
                    .collect()
            }
            SearchMode::Ranked => searcher
                .search(&query, &TopDocs::with_limit(max_hits))?
                .into_iter()
                .map(|(_score, address)| address)
                .collect(),
        };

        let mut hits = Vec::with_capacity(addresses.len());
        let mut seen = std::collections::HashSet::new();
        for address in addresses {
            let doc: TantivyDocument = searcher.doc(address)?;
            let id = doc.get_first(self.schema.id).and_then(|v| v.as_u64()).unwrap_or_default();
            let concept_id = doc
                .get_first(self.schema.concept_id)
                .and_then(|v| v.as_u64())
                .unwrap_or_default();
            let term = doc
                .get_first(self.schema.term)
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string();
            if request.remove_duplicates && !seen.insert((concept_id, term.to_lowercase())) {
                continue;
            }
            let preferred_term = request.language_refsets.iter().find_map(|&refset| {
                let field = self.schema.refset_term_field(refset)?;
                doc.get_first(field).and_then(|v| v.as_str()).map(str::to_string)
            });
            hits.push(SearchHit { id, concept_id, term, preferred_term });
        }
        Ok(hits)
    }

    fn build_query(
        &self,
        store: &SnomedStore,
        request: &SearchRequest,
        fuzzy: u8,
    ) -> QueryResult<Box<dyn Query>> {
        let queries = Queries::new(&self.schema, store);
        let mut clauses: Vec<(Occur, Box<dyn Query>)> = Vec::new();

        let tokens = self.tokenize(&request.s);
        match request.mode {
            SearchMode::Autocomplete => {
                for token in &tokens {
                    clauses.push((Occur::Must, self.token_query(token, fuzzy)));
                }
            }
            SearchMode::Ranked => {
                if !tokens.is_empty() {
                    let per_token: Vec<Box<dyn Query>> =
                        tokens.iter().map(|token| self.token_query(token, fuzzy)).collect();
                    clauses.push((Occur::Must, queries.or_of(per_token)));
                }
            }
        }

        if let Some(constraint) = &request.constraint {
            let evaluator = EclEvaluator::new(self, store);
            let (include, exclude) = evaluator.rewrite(constraint)?;
            clauses.push((Occur::Must, include));
            if let Some(exclude) = exclude {
                clauses.push((Occur::MustNot, exclude));
            }
        }

        if !request.include_fsn {
            clauses.push((
                Occur::MustNot,
                Box::new(TermQuery::new(
                    Term::from_field_u64(self.schema.type_id, DescriptionType::FSN_ID),
                    IndexRecordOption::Basic,
                )),
            ));
        }
        if !request.include_inactive_concepts {
            clauses.push((
                Occur::Must,
                Box::new(TermQuery::new(
                    Term::from_field_text(self.schema.concept_active, "1"),
                    IndexRecordOption::Basic,
                )),
            ));
        }
        if !request.include_inactive_descriptions {
            clauses.push((
                Occur::Must,
                Box::new(TermQuery::new(
                    Term::from_field_text(self.schema.description_active, "1"),
                    IndexRecordOption::Basic,
                )),
            ));
        }
        for &(type_id, value) in &request.properties {
            clauses.push((Occur::Must, queries.attribute_descendant_or_self_of(type_id, value)));
        }
        if !request.concept_refsets.is_empty() {
            let terms: Vec<Term> = request
                .concept_refsets
                .iter()
                .map(|&refset| Term::from_field_u64(self.schema.concept_refsets, refset))
                .collect();
            clauses.push((Occur::Must, Box::new(TermSetQuery::new(terms))));
        }

        Ok(Box::new(BooleanQuery::new(clauses)))
    }

    /// Per-token query: prefix OR exact OR (optionally) fuzzy.
    fn token_query(&self, token: &str, fuzzy: u8) -> Box<dyn Query> {
        let term = Term::from_field_text(self.schema.nterm, token);
        let mut options: Vec<(Occur, Box<dyn Query>)> = vec![
            (Occur::Should, Box::new(FuzzyTermQuery::new_prefix(term.clone(), 0, true))),
            (Occur::Should, Box::new(TermQuery::new(term.clone(), IndexRecordOption::Basic))),
        ];
        if fuzzy > 0 {
            options
                .push((Occur::Should, Box::new(FuzzyTermQuery::new(term, fuzzy.min(2), true))));
        }
        Box::new(BooleanQuery::new(options))
    }

    /// Runs the registered folding analyzer over the input.
    fn tokenize(&self, text: &str) -> Vec<String> {
        let Some(mut analyzer) = self.index.tokenizers().get(FOLDING_TOKENIZER) else {
            return Vec::new();
        };
        let mut tokens = Vec::new();
        let mut stream = analyzer.token_stream(text);
        stream.process(&mut |token| tokens.push(token.text.clone()));
        tokens
    }
}

/// Multiplies BM25 scores by the stored `1/sqrt(len(term))` fast field.
fn length_boost_scorer(
    segment_reader: &SegmentReader,
) -> impl Fn(DocId, Score) -> Score + 'static {
    let boosts = segment_reader.fast_fields().f64(LENGTH_BOOST).ok();
    move |doc: DocId, score: Score| match &boosts {
        Some(column) => score * column.first(doc).unwrap_or(1.0) as f32,
        None => score,
    }
}
