use serde::{Deserialize, Serialize};

use crate::types::{Direction, Kind, Record};

/// Display filter for the flat record view.
///
/// Evaluation is a pure conjunction of every field. Empty prefixes match
/// everything, and [`FilterSpec::default`] lets every record through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilterSpec {
    pub include_outbound: bool,
    pub include_inbound: bool,
    pub include_calls: bool,
    pub include_returns: bool,
    pub client_prefix: String,
    pub service_prefix: String,
}

impl Default for FilterSpec {
    fn default() -> Self {
        Self {
            include_outbound: true,
            include_inbound: true,
            include_calls: true,
            include_returns: true,
            client_prefix: String::new(),
            service_prefix: String::new(),
        }
    }
}

impl FilterSpec {
    /// Every call and return, outbound traffic only.
    pub fn outbound_only() -> Self {
        Self {
            include_inbound: false,
            ..Self::default()
        }
    }

    pub fn matches(&self, record: &Record) -> bool {
        let direction_ok = match record.direction {
            Direction::Outbound => self.include_outbound,
            Direction::Inbound => self.include_inbound,
        };
        if !direction_ok {
            return false;
        }

        let kind_ok = match record.kind {
            Kind::Call => self.include_calls,
            Kind::Return => self.include_returns,
        };
        if !kind_ok {
            return false;
        }

        if !self.client_prefix.is_empty() && !record.client.starts_with(&self.client_prefix) {
            return false;
        }

        if !self.service_prefix.is_empty() && !record.service.starts_with(&self.service_prefix) {
            return false;
        }

        true
    }

    /// True when this filter lets every record through.
    pub fn is_permissive(&self) -> bool {
        *self == Self::default()
    }
}

/// Keep the records the filter matches, preserving their order.
pub fn filter_records<'a, I, R>(records: I, spec: &'a FilterSpec) -> impl Iterator<Item = R> + 'a
where
    I: IntoIterator<Item = R> + 'a,
    I::IntoIter: 'a,
    R: AsRef<Record> + 'a,
{
    records
        .into_iter()
        .filter(move |record| spec.matches(record.as_ref()))
}

impl AsRef<Record> for Record {
    fn as_ref(&self) -> &Record {
        self
    }
}
