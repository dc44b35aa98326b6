use serde::{Deserialize, Serialize};

/// Value stored in a search slot that was attempted and failed.
pub const ERROR_SENTINEL: &str = "error";

/// One API method to find documentation for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodRecord {
    pub name: String,
    /// e.g. "add user"
    pub method_label: String,
    /// e.g. "https://api.bitrix24.com/rest/user.add"
    pub method_link: String,
}

impl MethodRecord {
    pub fn new(
        name: impl Into<String>,
        method_label: impl Into<String>,
        method_link: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            method_label: method_label.into(),
            method_link: method_link.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Found(String),
    NotFound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Engine {
    Fast,
    AiAssisted,
}

impl Engine {
    /// Engine name understood by the search provider.
    pub fn as_param(&self) -> &'static str {
        match self {
            Engine::Fast => "google_light",
            Engine::AiAssisted => "google_ai_mode",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchSlot {
    SearchMethodName,
    SearchMethodLink,
    AiMethodName,
    AiMethodLink,
}

impl SearchSlot {
    pub const ALL: [SearchSlot; 4] = [
        SearchSlot::SearchMethodName,
        SearchSlot::SearchMethodLink,
        SearchSlot::AiMethodName,
        SearchSlot::AiMethodLink,
    ];

    pub fn field_name(&self) -> &'static str {
        match self {
            SearchSlot::SearchMethodName => "search_method_name",
            SearchSlot::SearchMethodLink => "search_method_link",
            SearchSlot::AiMethodName => "ai_method_name",
            SearchSlot::AiMethodLink => "ai_method_link",
        }
    }

    pub fn engine(&self) -> Engine {
        match self {
            SearchSlot::SearchMethodName | SearchSlot::SearchMethodLink => Engine::Fast,
            SearchSlot::AiMethodName | SearchSlot::AiMethodLink => Engine::AiAssisted,
        }
    }

    /// Build this slot's query text for a record.
    pub fn query_text(&self, record: &MethodRecord) -> String {
        match self {
            SearchSlot::SearchMethodName | SearchSlot::AiMethodName => format!(
                "{} {} api documentation link",
                record.name, record.method_label
            ),
            SearchSlot::SearchMethodLink | SearchSlot::AiMethodLink => {
                format!("{} {} api documentation", record.name, record.method_link)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub engine: Engine,
    pub text: String,
    pub slot: SearchSlot,
}

impl SearchQuery {
    /// The four queries issued for a record, in slot order.
    pub fn for_record(record: &MethodRecord) -> [SearchQuery; 4] {
        SearchSlot::ALL.map(|slot| SearchQuery {
            engine: slot.engine(),
            text: slot.query_text(record),
            slot,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotValue {
    Link(String),
    Error,
}

impl SlotValue {
    pub fn as_str(&self) -> &str {
        match self {
            SlotValue::Link(link) => link,
            SlotValue::Error => ERROR_SENTINEL,
        }
    }

    pub fn is_link(&self) -> bool {
        matches!(self, SlotValue::Link(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOutcome {
    pub search_method_name: SlotValue,
    pub search_method_link: SlotValue,
    pub ai_method_name: SlotValue,
    pub ai_method_link: SlotValue,
}

impl SearchOutcome {
    pub fn all_error() -> Self {
        Self {
            search_method_name: SlotValue::Error,
            search_method_link: SlotValue::Error,
            ai_method_name: SlotValue::Error,
            ai_method_link: SlotValue::Error,
        }
    }

    pub fn get(&self, slot: SearchSlot) -> &SlotValue {
        match slot {
            SearchSlot::SearchMethodName => &self.search_method_name,
            SearchSlot::SearchMethodLink => &self.search_method_link,
            SearchSlot::AiMethodName => &self.ai_method_name,
            SearchSlot::AiMethodLink => &self.ai_method_link,
        }
    }

    pub fn error_count(&self) -> usize {
        SearchSlot::ALL
            .iter()
            .filter(|slot| !self.get(**slot).is_link())
            .count()
    }
}

/// How an item's documentation was resolved. Direct probing and search are
/// mutually exclusive, so a record never carries both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    OpenApi(String),
    Search(SearchOutcome),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRecord {
    pub method: MethodRecord,
    pub resolution: Resolution,
}

impl ResultRecord {
    pub fn new(method: MethodRecord, resolution: Resolution) -> Self {
        Self { method, resolution }
    }

    /// Result for an item whose processing hit a defect.
    pub fn failed(method: MethodRecord) -> Self {
        Self::new(method, Resolution::Search(SearchOutcome::all_error()))
    }

    /// Empty when search was used.
    pub fn openapi_link(&self) -> &str {
        match &self.resolution {
            Resolution::OpenApi(link) => link,
            Resolution::Search(_) => "",
        }
    }

    /// Empty when the direct probe succeeded and search was never attempted.
    pub fn slot(&self, slot: SearchSlot) -> &str {
        match &self.resolution {
            Resolution::OpenApi(_) => "",
            Resolution::Search(outcome) => outcome.get(slot).as_str(),
        }
    }

    /// True when at least one usable link was found.
    pub fn is_documented(&self) -> bool {
        match &self.resolution {
            Resolution::OpenApi(_) => true,
            Resolution::Search(outcome) => outcome.error_count() < SearchSlot::ALL.len(),
        }
    }
}
