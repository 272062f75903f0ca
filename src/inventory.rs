//! Management/inventory queries (WMI).
//!
//! Queries are written in the small `SELECT <fields> FROM <class>` subset of WQL
//! that the probes need. Rows come back as maps of field name to value; fields
//! that are empty or null are left out of the row.

use std::collections::BTreeMap;
use std::process::Command;
use std::sync::OnceLock;

use regex::Regex;

use crate::errors::{InventoryError, InventoryResult};

/// One result row: field name to non-empty value.
pub type QueryRow = BTreeMap<String, String>;

/// Source of inventory query results.
pub trait InventoryQuery {
    fn query(&self, wql: &str) -> InventoryResult<Vec<QueryRow>>;
}

/// A parsed `SELECT <fields> FROM <class>` statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectQuery {
    pub class: String,
    pub fields: Vec<String>,
}

fn select_regex() -> &'static Regex {
    static SELECT: OnceLock<Regex> = OnceLock::new();
    SELECT.get_or_init(|| {
        Regex::new(r"(?i)^\s*SELECT\s+(.+?)\s+FROM\s+([A-Za-z_][A-Za-z0-9_]*)\s*$")
            .expect("select pattern is valid")
    })
}

/// Parse a WQL `SELECT` statement.
///
/// # Errors
///
/// Returns [`InventoryError::InvalidQuery`] for anything other than a plain
/// field list and class name (`*`, `WHERE` clauses and so on are not supported).
pub fn parse_select(wql: &str) -> InventoryResult<SelectQuery> {
    let captures = select_regex()
        .captures(wql)
        .ok_or_else(|| InventoryError::InvalidQuery(wql.to_string()))?;

    let fields: Vec<String> = captures[1]
        .split(',')
        .map(|f| f.trim().to_string())
        .collect();

    let valid_field =
        |f: &String| !f.is_empty() && f.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !fields.iter().all(valid_field) {
        return Err(InventoryError::InvalidQuery(wql.to_string()));
    }

    Ok(SelectQuery {
        class: captures[2].to_string(),
        fields,
    })
}

/// Parse `wmic ... /format:list` output into rows.
///
/// Each instance is a block of `Name=Value` lines; blocks are separated by
/// blank lines. Lines without `=` are ignored, as are empty values.
pub fn parse_list_output(output: &str) -> Vec<QueryRow> {
    let mut rows = Vec::new();
    let mut current = QueryRow::new();
    let mut in_block = false;

    for line in output.lines() {
        let line = line.trim_matches(|c: char| c == '\r' || c.is_whitespace());
        if line.is_empty() {
            if in_block && !current.is_empty() {
                rows.push(std::mem::take(&mut current));
            }
            in_block = false;
            continue;
        }

        let Some((name, value)) = line.split_once('=') else {
            continue;
        };
        in_block = true;
        let value = value.trim();
        if !value.is_empty() {
            current.insert(name.trim().to_string(), value.to_string());
        }
    }

    if !current.is_empty() {
        rows.push(current);
    }
    rows
}

/// Runs queries through the `wmic` command-line tool.
#[derive(Debug, Clone, Default)]
pub struct WmicQuery;

impl WmicQuery {
    pub fn new() -> Self {
        Self
    }
}

impl InventoryQuery for WmicQuery {
    fn query(&self, wql: &str) -> InventoryResult<Vec<QueryRow>> {
        let select = parse_select(wql)?;
        let fields = select.fields.join(",");

        let output = Command::new("wmic")
            .args(["path", &select.class, "get", &fields, "/format:list"])
            .output()
            .map_err(|e| InventoryError::Query(format!("spawn wmic: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(InventoryError::Query(format!(
                "wmic {} exited with {}: {}",
                select.class,
                output.status,
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(parse_list_output(&stdout))
    }
}

/// Query results kept in memory, keyed by class name.
///
/// Queries are answered by projecting the stored rows onto the selected fields.
/// Used on platforms without WMI and in tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryInventory {
    classes: BTreeMap<String, Vec<QueryRow>>,
}

impl MemoryInventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one row for `class`, given as `(field, value)` pairs.
    pub fn with_row(mut self, class: &str, fields: &[(&str, &str)]) -> Self {
        let row = fields
            .iter()
            .filter(|(_, value)| !value.is_empty())
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();
        self.classes
            .entry(class.to_lowercase())
            .or_default()
            .push(row);
        self
    }
}

impl InventoryQuery for MemoryInventory {
    fn query(&self, wql: &str) -> InventoryResult<Vec<QueryRow>> {
        let select = parse_select(wql)?;
        let Some(rows) = self.classes.get(&select.class.to_lowercase()) else {
            return Ok(Vec::new());
        };

        Ok(rows
            .iter()
            .map(|row| {
                row.iter()
                    .filter(|(name, _)| {
                        select.fields.iter().any(|f| f.eq_ignore_ascii_case(name))
                    })
                    .map(|(name, value)| (name.clone(), value.clone()))
                    .collect::<QueryRow>()
            })
            .filter(|row| !row.is_empty())
            .collect())
    }
}
