//! Workflow parameter model
//!
//! The controller keeps all durable state in a parameter store as
//! string-valued keys namespaced per table. This module defines the key
//! layout, the value encodings, and a typed snapshot loaded at the start of
//! every cycle.

use crate::adapters::traits::ParameterStore;
use crate::domain::errors::ParamStoreError;
use crate::domain::ids::TableId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Operator pause/run switch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkflowAction {
    /// Skip all work this cycle
    Pause,
    /// Normal operation
    Run,
}

impl WorkflowAction {
    /// Stored string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowAction::Pause => "PAUSE",
            WorkflowAction::Run => "RUN",
        }
    }
}

impl fmt::Display for WorkflowAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for WorkflowAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "PAUSE" => Ok(WorkflowAction::Pause),
            "RUN" => Ok(WorkflowAction::Run),
            other => Err(format!(
                "Invalid workflow action '{}'. Must be PAUSE or RUN",
                other
            )),
        }
    }
}

/// Workflow lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkflowState {
    /// Incremental exports are proceeding normally
    Normal,
    /// The watermark fell outside the PITR window; a full-export reset is
    /// required before incremental exports resume
    PitrGap,
}

impl WorkflowState {
    /// Stored string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowState::Normal => "NORMAL",
            WorkflowState::PitrGap => "PITR_GAP",
        }
    }
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for WorkflowState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "NORMAL" => Ok(WorkflowState::Normal),
            "PITR_GAP" => Ok(WorkflowState::PitrGap),
            other => Err(format!(
                "Invalid workflow state '{}'. Must be NORMAL or PITR_GAP",
                other
            )),
        }
    }
}

/// The per-table parameter keys the controller owns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKey {
    /// `workflow-action`: PAUSE or RUN
    Action,
    /// `workflow-state`: NORMAL or PITR_GAP
    State,
    /// `workflow-initiated`: whether a full export has completed once
    Initiated,
    /// `last-incremental-export-time`: incremental watermark
    LastIncrementalExportTime,
    /// `full-export-time`: time of the last full export
    FullExportTime,
}

impl ParamKey {
    /// Key suffix below the table namespace
    pub fn suffix(&self) -> &'static str {
        match self {
            ParamKey::Action => "workflow-action",
            ParamKey::State => "workflow-state",
            ParamKey::Initiated => "workflow-initiated",
            ParamKey::LastIncrementalExportTime => "last-incremental-export-time",
            ParamKey::FullExportTime => "full-export-time",
        }
    }

    /// All keys, in a stable order
    pub fn all() -> [ParamKey; 5] {
        [
            ParamKey::Action,
            ParamKey::State,
            ParamKey::Initiated,
            ParamKey::LastIncrementalExportTime,
            ParamKey::FullExportTime,
        ]
    }
}

/// Key namespace for one table's parameters
///
/// Produces keys of the form `<prefix>/<table>/<suffix>`, e.g.
/// `/tidemark/orders/workflow-state`.
#[derive(Debug, Clone)]
pub struct TableNamespace {
    prefix: String,
    table_id: TableId,
}

impl TableNamespace {
    /// Create a namespace for `table_id` below `prefix`
    pub fn new(prefix: impl Into<String>, table_id: TableId) -> Self {
        let mut prefix = prefix.into();
        while prefix.ends_with('/') {
            prefix.pop();
        }
        Self { prefix, table_id }
    }

    /// The table this namespace belongs to
    pub fn table_id(&self) -> &TableId {
        &self.table_id
    }

    /// Full key for a parameter
    pub fn key(&self, param: ParamKey) -> String {
        format!("{}/{}/{}", self.prefix, self.table_id, param.suffix())
    }
}

/// Typed snapshot of a table's workflow parameters
///
/// Missing parameters fall back to safe defaults: action RUN, state NORMAL,
/// initiated false, watermarks absent. A first cycle against an empty store
/// therefore routes to the full-export path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSnapshot {
    /// Operator pause/run switch
    pub action: WorkflowAction,

    /// Lifecycle phase
    pub state: WorkflowState,

    /// Whether a full export has completed at least once
    pub initiated: bool,

    /// Watermark of the last successful incremental export
    pub last_incremental_export_time: Option<DateTime<Utc>>,

    /// Time of the last full export
    pub full_export_time: Option<DateTime<Utc>>,
}

impl ParamSnapshot {
    /// Load the snapshot from the parameter store
    ///
    /// # Errors
    ///
    /// Returns an error on throttling or unparseable stored values; a
    /// missing key is not an error.
    pub async fn load(
        store: &dyn ParameterStore,
        ns: &TableNamespace,
    ) -> Result<Self, ParamStoreError> {
        let action = match read_optional(store, &ns.key(ParamKey::Action)).await? {
            Some(raw) => parse_value(&ns.key(ParamKey::Action), &raw)?,
            None => WorkflowAction::Run,
        };
        let state = match read_optional(store, &ns.key(ParamKey::State)).await? {
            Some(raw) => parse_value(&ns.key(ParamKey::State), &raw)?,
            None => WorkflowState::Normal,
        };
        let initiated = match read_optional(store, &ns.key(ParamKey::Initiated)).await? {
            Some(raw) => parse_bool(&ns.key(ParamKey::Initiated), &raw)?,
            None => false,
        };
        let last_incremental_export_time =
            match read_optional(store, &ns.key(ParamKey::LastIncrementalExportTime)).await? {
                Some(raw) => Some(parse_timestamp(
                    &ns.key(ParamKey::LastIncrementalExportTime),
                    &raw,
                )?),
                None => None,
            };
        let full_export_time = match read_optional(store, &ns.key(ParamKey::FullExportTime)).await?
        {
            Some(raw) => Some(parse_timestamp(&ns.key(ParamKey::FullExportTime), &raw)?),
            None => None,
        };

        Ok(Self {
            action,
            state,
            initiated,
            last_incremental_export_time,
            full_export_time,
        })
    }

    /// The incremental watermark, if it can be trusted
    ///
    /// The incremental watermark is only trusted when a full export has
    /// completed once and the workflow is not in a PITR gap.
    pub fn trusted_incremental_watermark(&self) -> Option<DateTime<Utc>> {
        if self.initiated && self.state != WorkflowState::PitrGap {
            self.last_incremental_export_time
        } else {
            None
        }
    }

    /// Watermark to start the next incremental window from
    ///
    /// Falls back to the full-export time when the incremental watermark is
    /// absent or untrusted.
    pub fn export_watermark(&self) -> Option<DateTime<Utc>> {
        self.trusted_incremental_watermark()
            .or(self.full_export_time)
    }
}

/// Encode a timestamp the way watermark parameters store it
pub fn encode_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}

async fn read_optional(
    store: &dyn ParameterStore,
    key: &str,
) -> Result<Option<String>, ParamStoreError> {
    match store.get(key).await {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

fn parse_value<T: FromStr<Err = String>>(key: &str, raw: &str) -> Result<T, ParamStoreError> {
    raw.parse().map_err(|message| ParamStoreError::InvalidValue {
        key: key.to_string(),
        message,
    })
}

fn parse_bool(key: &str, raw: &str) -> Result<bool, ParamStoreError> {
    match raw.trim().to_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(ParamStoreError::InvalidValue {
            key: key.to_string(),
            message: format!("Invalid boolean '{}'. Must be true or false", other),
        }),
    }
}

fn parse_timestamp(key: &str, raw: &str) -> Result<DateTime<Utc>, ParamStoreError> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ParamStoreError::InvalidValue {
            key: key.to_string(),
            message: format!("Invalid RFC 3339 timestamp '{}': {}", raw, e),
        })
}
