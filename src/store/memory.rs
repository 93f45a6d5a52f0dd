//! In-memory document store
//!
//! Holds a primary collection plus named side collections used by
//! `$lookup` and populate. Every call is recorded so callers can inspect
//! exactly what the engine asked for.

use super::eval::{
    apply_projection, matches_filter, resolve_expression, sort_documents, values_equal,
};
use super::{DocumentStore, FindRequest, Populate};
use crate::error::{Error, Result};
use crate::query::limit_value;
use crate::types::{Document, Stage, Verbosity};
use crate::value::{get_path, set_path};
use async_trait::async_trait;
use bson::{doc, Bson};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;

/// A call received by a `MemoryStore`
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    /// `find`
    Find(FindRequest),
    /// `aggregate`
    Aggregate(Vec<Stage>),
    /// `count_documents`
    Count(Document),
    /// `explain`
    Explain(FindRequest, Verbosity),
}

/// In-memory store evaluating queries and pipelines over BSON documents
#[derive(Debug)]
pub struct MemoryStore {
    /// Name reported as the namespace in explain output
    name: String,
    /// Primary collection
    documents: Vec<Document>,
    /// Side collections for `$lookup` / populate
    collections: HashMap<String, Vec<Document>>,
    /// Simulated latency applied to every call
    latency: Option<Duration>,
    /// When set, every call fails with this message
    failure: Option<String>,
    /// Calls received so far
    calls: Mutex<Vec<StoreCall>>,
}

impl MemoryStore {
    /// Create a store over `documents`
    pub fn new(name: impl Into<String>, documents: Vec<Document>) -> Self {
        Self {
            name: name.into(),
            documents,
            collections: HashMap::new(),
            latency: None,
            failure: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Add a side collection
    #[must_use]
    pub fn with_collection(mut self, name: impl Into<String>, documents: Vec<Document>) -> Self {
        self.collections.insert(name.into(), documents);
        self
    }

    /// Delay every call by `latency`
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Fail every call with a store error
    #[must_use]
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    /// Collection name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of documents in the primary collection
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Check if the primary collection is empty
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Calls received so far
    pub async fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().await.clone()
    }

    async fn begin(&self, call: StoreCall) -> Result<()> {
        self.calls.lock().await.push(call);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        match &self.failure {
            Some(message) => Err(Error::store(message.clone())),
            None => Ok(()),
        }
    }

    fn collection(&self, name: &str) -> Result<&[Document]> {
        if name == self.name {
            return Ok(&self.documents);
        }
        self.collections
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| Error::store(format!("unknown collection '{name}'")))
    }

    fn filtered(&self, filter: &Document) -> Result<Vec<Document>> {
        let mut out = Vec::new();
        for doc in &self.documents {
            if matches_filter(doc, filter)? {
                out.push(doc.clone());
            }
        }
        Ok(out)
    }

    fn run_find(&self, request: &FindRequest) -> Result<Vec<Document>> {
        let mut docs = self.filtered(&request.filter)?;
        sort_documents(&mut docs, &request.sort)?;
        if request.limit > 0 {
            docs.truncate(request.limit as usize);
        }
        for populate in &request.populate {
            for doc in &mut docs {
                self.populate(doc, populate)?;
            }
        }
        if let Some(projection) = &request.projection {
            docs = docs
                .iter()
                .map(|d| apply_projection(d, projection))
                .collect::<Result<_>>()?;
        }
        Ok(docs)
    }

    fn populate(&self, document: &mut Document, populate: &Populate) -> Result<()> {
        let Some(reference) = get_path(document, &populate.path).cloned() else {
            return Ok(());
        };
        let foreign = self.collection(&populate.from)?;
        let resolve = |key: &Bson| {
            foreign
                .iter()
                .find(|d| values_equal(get_path(d, &populate.foreign_field), key))
                .cloned()
                .map_or(Bson::Null, Bson::Document)
        };
        let resolved = match &reference {
            Bson::Array(keys) => Bson::Array(keys.iter().map(resolve).collect()),
            key => resolve(key),
        };
        set_path(document, &populate.path, resolved);
        Ok(())
    }

    fn run_pipeline(&self, pipeline: &[Stage]) -> Result<Vec<Document>> {
        let mut docs = self.documents.clone();
        for stage in pipeline {
            docs = self.apply_stage(docs, stage)?;
        }
        Ok(docs)
    }

    fn apply_stage(&self, mut docs: Vec<Document>, stage: &Stage) -> Result<Vec<Document>> {
        let (name, spec) = match stage.iter().next() {
            Some(entry) if stage.len() == 1 => entry,
            _ => {
                return Err(Error::store(format!(
                    "pipeline stage must have exactly one operator, got {stage}"
                )))
            }
        };
        let spec_document = || {
            spec.as_document()
                .ok_or_else(|| Error::store(format!("{name} expects a document, got {spec}")))
        };

        match name.as_str() {
            "$match" => {
                let filter = spec_document()?;
                let mut out = Vec::with_capacity(docs.len());
                for doc in docs {
                    if matches_filter(&doc, filter)? {
                        out.push(doc);
                    }
                }
                Ok(out)
            }
            "$sort" => {
                sort_documents(&mut docs, spec_document()?)?;
                Ok(docs)
            }
            "$limit" => {
                let n = stage_count(name, spec)?;
                docs.truncate(n);
                Ok(docs)
            }
            "$skip" => {
                let n = stage_count(name, spec)?;
                Ok(docs.into_iter().skip(n).collect())
            }
            "$project" => {
                let projection = spec_document()?;
                docs.iter().map(|d| apply_projection(d, projection)).collect()
            }
            "$addFields" | "$set" => {
                let fields = spec_document()?;
                for doc in &mut docs {
                    for (path, expression) in fields {
                        let value = resolve_expression(doc, expression);
                        set_path(doc, path, value);
                    }
                }
                Ok(docs)
            }
            "$lookup" => self.lookup(docs, spec_document()?),
            "$unwind" => unwind(docs, spec),
            "$group" => group(&docs, spec_document()?),
            "$count" => {
                let field = spec
                    .as_str()
                    .ok_or_else(|| Error::store("$count expects a field name"))?;
                if docs.is_empty() {
                    return Ok(Vec::new());
                }
                Ok(vec![doc! { field: docs.len() as i64 }])
            }
            other => Err(Error::store(format!("unsupported pipeline stage '{other}'"))),
        }
    }

    fn lookup(&self, mut docs: Vec<Document>, spec: &Document) -> Result<Vec<Document>> {
        let field = |key: &str| {
            spec.get_str(key)
                .map_err(|_| Error::store(format!("$lookup requires '{key}'")))
        };
        let from = field("from")?;
        let local = field("localField")?;
        let foreign_field = field("foreignField")?;
        let as_field = field("as")?;

        let foreign = self.collection(from)?;
        for doc in &mut docs {
            let key = get_path(doc, local).cloned().unwrap_or(Bson::Null);
            let joined: Vec<Bson> = foreign
                .iter()
                .filter(|f| values_equal(get_path(f, foreign_field), &key))
                .cloned()
                .map(Bson::Document)
                .collect();
            set_path(doc, as_field, Bson::Array(joined));
        }
        Ok(docs)
    }
}

fn stage_count(name: &str, spec: &Bson) -> Result<usize> {
    let count = match spec {
        Bson::Int32(n) => i64::from(*n),
        Bson::Int64(n) => *n,
        Bson::Double(f) if f.fract() == 0.0 => *f as i64,
        _ => -1,
    };
    usize::try_from(count)
        .map_err(|_| Error::store(format!("{name} expects a non-negative integer, got {spec}")))
}

fn unwind(docs: Vec<Document>, spec: &Bson) -> Result<Vec<Document>> {
    let (raw_path, preserve) = match spec {
        Bson::String(path) => (path.as_str(), false),
        Bson::Document(options) => (
            options
                .get_str("path")
                .map_err(|_| Error::store("$unwind requires 'path'"))?,
            options
                .get_bool("preserveNullAndEmptyArrays")
                .unwrap_or(false),
        ),
        other => return Err(Error::store(format!("invalid $unwind {other}"))),
    };
    let path = raw_path
        .strip_prefix('$')
        .ok_or_else(|| Error::store("$unwind path must start with '$'"))?;

    let mut out = Vec::new();
    for doc in docs {
        match get_path(&doc, path).cloned() {
            Some(Bson::Array(items)) if !items.is_empty() => {
                for item in items {
                    let mut copy = doc.clone();
                    set_path(&mut copy, path, item);
                    out.push(copy);
                }
            }
            Some(Bson::Array(_) | Bson::Null) | None => {
                if preserve {
                    out.push(doc);
                }
            }
            Some(_) => out.push(doc),
        }
    }
    Ok(out)
}

/// `$group` with `$sum` accumulators, groups emitted in first-seen order
fn group(docs: &[Document], spec: &Document) -> Result<Vec<Document>> {
    let id_expr = spec
        .get("_id")
        .ok_or_else(|| Error::store("$group requires '_id'"))?;

    let mut groups: Vec<(Bson, Document)> = Vec::new();
    for doc in docs {
        let key = resolve_expression(doc, id_expr);
        let index = match groups.iter().position(|(k, _)| *k == key) {
            Some(i) => i,
            None => {
                groups.push((key.clone(), doc! { "_id": key }));
                groups.len() - 1
            }
        };
        let acc = &mut groups[index].1;

        for (field, accumulator) in spec.iter().filter(|(k, _)| k.as_str() != "_id") {
            let operand = accumulator
                .as_document()
                .and_then(|a| a.get("$sum"))
                .ok_or_else(|| Error::store(format!("unsupported accumulator for '{field}'")))?;
            let addend = resolve_expression(doc, operand);
            let current = acc.get(field).cloned().unwrap_or(Bson::Int32(0));
            acc.insert(field.as_str(), add_numbers(&current, &addend));
        }
    }

    Ok(groups.into_iter().map(|(_, acc)| acc).collect())
}

fn add_numbers(a: &Bson, b: &Bson) -> Bson {
    match (a, b) {
        (Bson::Int32(x), Bson::Int32(y)) => match x.checked_add(*y) {
            Some(sum) => Bson::Int32(sum),
            None => Bson::Int64(i64::from(*x) + i64::from(*y)),
        },
        _ => match (integer(a), integer(b)) {
            (Some(x), Some(y)) => Bson::Int64(x.saturating_add(y)),
            _ => match (float(a), float(b)) {
                (Some(x), Some(y)) => Bson::Double(x + y),
                // $sum ignores non-numeric operands
                (Some(_), None) => a.clone(),
                _ => b.clone(),
            },
        },
    }
}

fn integer(value: &Bson) -> Option<i64> {
    match value {
        Bson::Int32(i) => Some(i64::from(*i)),
        Bson::Int64(i) => Some(*i),
        _ => None,
    }
}

fn float(value: &Bson) -> Option<f64> {
    match value {
        Bson::Double(f) => Some(*f),
        other => integer(other).map(|i| i as f64),
    }
}

fn explain_plan(request: &FindRequest) -> Document {
    let scan = doc! {
        "stage": "COLLSCAN",
        "filter": request.filter.clone(),
        "direction": "forward",
    };
    let sorted = doc! {
        "stage": "SORT",
        "sortPattern": request.sort.clone(),
        "inputStage": scan,
    };
    let projected = match &request.projection {
        Some(projection) => doc! {
            "stage": "PROJECTION_DEFAULT",
            "transformBy": projection.clone(),
            "inputStage": sorted,
        },
        None => sorted,
    };
    if request.limit > 0 {
        doc! {
            "stage": "LIMIT",
            "limitAmount": limit_value(request.limit),
            "inputStage": projected,
        }
    } else {
        projected
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find(&self, request: &FindRequest) -> Result<Vec<Document>> {
        self.begin(StoreCall::Find(request.clone())).await?;
        self.run_find(request)
    }

    async fn aggregate(&self, pipeline: &[Stage]) -> Result<Vec<Document>> {
        self.begin(StoreCall::Aggregate(pipeline.to_vec())).await?;
        self.run_pipeline(pipeline)
    }

    async fn count_documents(&self, filter: &Document) -> Result<u64> {
        self.begin(StoreCall::Count(filter.clone())).await?;
        Ok(self.filtered(filter)?.len() as u64)
    }

    async fn explain(&self, request: &FindRequest, verbosity: Verbosity) -> Result<Document> {
        self.begin(StoreCall::Explain(request.clone(), verbosity))
            .await?;

        let mut out = doc! {
            "queryPlanner": {
                "namespace": self.name.as_str(),
                "parsedQuery": request.filter.clone(),
                "winningPlan": explain_plan(request),
                "rejectedPlans": [],
            }
        };

        if verbosity.includes_execution() {
            let returned = self.run_find(request)?.len();
            out.insert(
                "executionStats",
                doc! {
                    "executionSuccess": true,
                    "nReturned": returned as i64,
                    "totalDocsExamined": self.documents.len() as i64,
                    "totalKeysExamined": 0_i64,
                },
            );
            if verbosity == Verbosity::AllPlansExecution {
                out.insert("allPlansExecution", Bson::Array(Vec::new()));
            }
        }
        out.insert("verbosity", verbosity.as_str());

        Ok(out)
    }
}
