//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, PageArgs};
use crate::config::PaginateConfig;
use crate::cursor::{Base64JsonCodec, CursorCodec};
use crate::error::{Error, Result, ResultExt};
use crate::paginate::{aggregate_paged, explain_paged, find_paged, FindQuery, PaginateOptions};
use crate::sort::{parse_sort, SortPlan};
use crate::store::{MemoryStore, Populate};
use crate::types::{Document, JsonObject, Stage};
use crate::value::{document_from_extjson, document_to_extjson};
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Find {
                page,
                filter,
                projection,
                populate,
            } => {
                self.find(page, filter.as_deref(), projection.as_deref(), populate)
                    .await
            }
            Commands::Aggregate {
                page,
                pipeline,
                post,
            } => self.aggregate(page, pipeline.as_deref(), post.as_deref()).await,
            Commands::Explain {
                page,
                filter,
                verbosity,
            } => self.explain(page, filter.as_deref(), (*verbosity).into()).await,
            Commands::DecodeCursor { sort, token } => self.decode_cursor(sort.as_deref(), token),
        }
    }

    /// Load and validate the pagination configuration
    fn load_config(&self) -> Result<PaginateConfig> {
        let config = match &self.cli.config {
            Some(path) => PaginateConfig::from_file(path)?,
            None => PaginateConfig::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Build an in-memory store from the data file and extra collections
    fn load_store(&self, data: &Path) -> Result<MemoryStore> {
        let name = data
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "documents".to_string());
        let mut store = MemoryStore::new(name, read_documents(data)?);

        for arg in &self.cli.collections {
            let (name, path) = parse_collection(arg)?;
            let documents = read_documents(&path)?;
            tracing::debug!(collection = %name, documents = documents.len(), "loaded collection");
            store = store.with_collection(name, documents);
        }

        tracing::info!(
            collection = store.name(),
            documents = store.len(),
            "loaded documents"
        );
        Ok(store)
    }

    /// Page through a find
    async fn find(
        &self,
        page: &PageArgs,
        filter: Option<&str>,
        projection: Option<&str>,
        populate: &[String],
    ) -> Result<()> {
        let config = self.load_config()?;
        let store = self.load_store(&page.data)?;
        let options = options_from(page)?;

        let mut query = FindQuery::new();
        query.filter = parse_document_arg("filter", filter)?;
        query.projection = parse_document_arg("projection", projection)?;
        for arg in populate {
            let (path, from) = arg.split_once('=').ok_or_else(|| {
                Error::invalid_options(format!("populate '{arg}' must be path=collection"))
            })?;
            query = query.populate(Populate::new(path, from));
        }

        let result = find_paged(&store, &config, &options, &query).await?;
        self.output_message(&result.to_extjson()?);
        Ok(())
    }

    /// Page through an aggregation
    async fn aggregate(
        &self,
        page: &PageArgs,
        pipeline: Option<&str>,
        post: Option<&str>,
    ) -> Result<()> {
        let config = self.load_config()?;
        let store = self.load_store(&page.data)?;
        let options = options_from(page)?;
        let pre = parse_stages("pipeline", pipeline)?;
        let post = parse_stages("post", post)?;

        let result = aggregate_paged(&store, &config, &options, &pre, &post).await?;
        self.output_message(&result.to_extjson()?);
        Ok(())
    }

    /// Explain the find a page would run
    async fn explain(
        &self,
        page: &PageArgs,
        filter: Option<&str>,
        verbosity: crate::types::Verbosity,
    ) -> Result<()> {
        let config = self.load_config()?;
        let store = self.load_store(&page.data)?;
        let options = options_from(page)?;

        let mut query = FindQuery::new();
        query.filter = parse_document_arg("filter", filter)?;

        let plan = explain_paged(&store, &config, &options, verbosity, &query).await?;
        self.output_message(&document_to_extjson(plan));
        Ok(())
    }

    /// Decode a token and show the values it anchors on
    fn decode_cursor(&self, sort: Option<&str>, token: &str) -> Result<()> {
        let config = self.load_config()?;
        let requested = sort.map(parse_sort).transpose()?.unwrap_or_default();
        let plan = SortPlan::resolve(requested, &config)?;
        let cursor = Base64JsonCodec.decode(&plan, token)?;

        let values: JsonObject = plan
            .fields()
            .iter()
            .zip(&cursor.values)
            .map(|(field, value)| {
                let value = value.clone().into_bson().into_relaxed_extjson();
                (field.path.clone(), value)
            })
            .collect();

        self.output_message(&json!({
            "direction": cursor.direction,
            "keys": plan.signature(),
            "values": values,
        }));
        Ok(())
    }

    /// Output a message
    fn output_message(&self, msg: &Value) {
        if self.cli.pretty {
            println!("{}", serde_json::to_string_pretty(msg).unwrap_or_default());
        } else {
            println!("{}", serde_json::to_string(msg).unwrap_or_default());
        }
    }
}

// ============================================================================
// Argument Helpers
// ============================================================================

/// Build paginate options from the shared arguments
fn options_from(page: &PageArgs) -> Result<PaginateOptions> {
    let sort = page.sort.as_deref().map(parse_sort).transpose()?.unwrap_or_default();
    Ok(PaginateOptions {
        sort,
        limit: page.limit,
        after: page.after.clone(),
        before: page.before.clone(),
    })
}

/// Split a `name=path` collection argument
fn parse_collection(arg: &str) -> Result<(String, PathBuf)> {
    match arg.split_once('=') {
        Some((name, path)) if !name.is_empty() && !path.is_empty() => {
            Ok((name.to_string(), PathBuf::from(path)))
        }
        _ => Err(Error::config(format!(
            "collection '{arg}' must be name=path"
        ))),
    }
}

/// Parse an optional inline JSON argument
fn parse_json_arg(name: &str, raw: Option<&str>) -> Result<Option<Value>> {
    raw.map(|raw| {
        serde_json::from_str::<Value>(raw).with_context(|| format!("Invalid --{name} JSON"))
    })
    .transpose()
}

/// Parse an optional inline extended JSON document
fn parse_document_arg(name: &str, raw: Option<&str>) -> Result<Option<Document>> {
    parse_json_arg(name, raw)?
        .map(|value| document_from_extjson(value).with_context(|| format!("Invalid --{name}")))
        .transpose()
}

/// Parse an optional inline JSON array of stages
fn parse_stages(name: &str, raw: Option<&str>) -> Result<Vec<Stage>> {
    match parse_json_arg(name, raw)? {
        None => Ok(Vec::new()),
        Some(Value::Array(stages)) => stages
            .into_iter()
            .map(|stage| document_from_extjson(stage).with_context(|| format!("Invalid --{name}")))
            .collect(),
        Some(_) => Err(Error::invalid_options(format!(
            "--{name} must be a JSON array of stages"
        ))),
    }
}

/// Read documents from a JSON array file or a file with one document per line
///
/// Values use relaxed or canonical extended JSON (`{"$date": ..}`, `{"$oid": ..}`).
fn read_documents(path: &Path) -> Result<Vec<Document>> {
    let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;

    if content.trim_start().starts_with('[') {
        return serde_json::from_str::<Vec<Value>>(&content)
            .with_context(|| format!("Invalid JSON in {}", path.display()))?
            .into_iter()
            .enumerate()
            .map(|(i, value)| {
                document_from_extjson(value)
                    .with_context(|| format!("Invalid document {} in {}", i, path.display()))
            })
            .collect();
    }

    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str::<Value>(line)
                .map_err(Error::from)
                .and_then(document_from_extjson)
                .with_context(|| format!("Invalid JSON at {}:{}", path.display(), i + 1))
        })
        .collect()
}
