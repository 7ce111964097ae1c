pub mod communities;
pub mod events;
pub mod jobs;
pub mod messages;
pub mod ping;
pub mod users;

use alumnet::{Filter, PersistenceService, RedisConnector};
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use clap::Args;
use comfy_table::{Cell, Table};
use serde::Serialize;

use crate::{
    output::{GlobalOptions, OutputManager, TableDisplay, create_table},
    views::{RecordDetail, RecordList, RecordView},
};

pub type Service = PersistenceService<RedisConnector>;

#[derive(Args, Debug, Default)]
pub struct ListArgs {
    /// Exact-match condition FIELD=VALUE (repeatable); VALUE is read as JSON when it parses
    #[arg(long = "filter", short = 'f', value_name = "FIELD=VALUE")]
    pub filters: Vec<String>,

    /// Print only the number of matching records
    #[arg(long)]
    pub count: bool,
}

impl ListArgs {
    pub fn filter(&self) -> Result<Option<Filter>> {
        if self.filters.is_empty() {
            return Ok(None);
        }
        let pairs = self
            .filters
            .iter()
            .map(|raw| Filter::parse_pair(raw).with_context(|| format!("invalid --filter {raw:?}")))
            .collect::<Result<Vec<_>>>()?;
        Ok(Some(pairs.into_iter().collect()))
    }
}

#[derive(Serialize)]
struct CountView {
    collection: &'static str,
    count: u64,
}

impl TableDisplay for CountView {
    fn to_table(&self, options: &GlobalOptions) -> Table {
        let mut table = create_table(options);
        table.add_row(vec![Cell::new(self.collection), Cell::new(self.count)]);
        table
    }

    fn to_compact(&self) -> String {
        self.count.to_string()
    }
}

pub async fn list<T: RecordView>(service: &Service, args: &ListArgs, output: &OutputManager) -> Result<()> {
    let filter = args.filter()?;
    if let Some(filter) = &filter {
        output.verbose(&format!("filter: {}", serde_json::to_string(filter)?));
    }
    if args.count {
        let count = service.count::<T>(filter.as_ref()).await?;
        return output.display(&CountView {
            collection: T::COLLECTION,
            count,
        });
    }
    let records = service.find::<T>(filter.as_ref()).await?;
    output.display(&RecordList(records))
}

pub async fn get<T: RecordView>(service: &Service, id: &str, output: &OutputManager) -> Result<()> {
    match service.find_by_id::<T>(id).await? {
        Some(record) => output.display(&RecordDetail(record)),
        None => anyhow::bail!("no {} with id {id}", T::LABEL),
    }
}

pub async fn delete<T: RecordView>(service: &Service, id: &str, output: &OutputManager) -> Result<()> {
    if service.delete::<T>(id).await? {
        output.success(&format!("Deleted {} {id}", T::LABEL));
        Ok(())
    } else {
        anyhow::bail!("no {} with id {id}", T::LABEL)
    }
}

pub fn show_saved<T: RecordView>(verb: &str, record: T, output: &OutputManager) -> Result<()> {
    output.success(&format!("{verb} {} {}", T::LABEL, record.id()));
    output.display(&RecordDetail(record))
}

/// Maps an optional flag onto a patch field. A field named in `--clear` is removed even when a value is given.
pub fn change<T>(value: Option<T>, field: &str, clear: &[String]) -> Option<Option<T>> {
    if clear.iter().any(|cleared| cleared == field) {
        Some(None)
    } else {
        value.map(Some)
    }
}

/// Accepts RFC 3339 timestamps or plain `YYYY-MM-DD` dates (midnight UTC).
pub fn parse_datetime(raw: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Ok(timestamp.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| format!("expected YYYY-MM-DD or an RFC 3339 timestamp, got {raw:?}"))
}
