use super::Partition;

/// One end of a [`Bundle`]: either a declared node or the system boundary.
///
/// `Elsewhere` is a first-class variant rather than a magic id; it only
/// becomes `null` at the serialization boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Node(String),
    Elsewhere,
}

impl Endpoint {
    pub fn node(id: impl Into<String>) -> Self {
        Endpoint::Node(id.into())
    }

    pub fn as_node(&self) -> Option<&str> {
        match self {
            Endpoint::Node(id) => Some(id),
            Endpoint::Elsewhere => None,
        }
    }

    pub fn is_elsewhere(&self) -> bool {
        matches!(self, Endpoint::Elsewhere)
    }
}

impl From<&str> for Endpoint {
    fn from(id: &str) -> Self {
        Endpoint::Node(id.to_string())
    }
}

impl From<String> for Endpoint {
    fn from(id: String) -> Self {
        Endpoint::Node(id)
    }
}

/// One conjunct of a [`FlowSelection`]: the attribute's value must (or, when
/// negated, must not) be one of `values`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionClause {
    pub attr: String,
    pub values: Vec<String>,
    pub negated: bool,
}

/// A row filter restricting which flows travel along a bundle.
///
/// Clauses are conjoined: a row matches only if every clause holds.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FlowSelection {
    pub clauses: Vec<SelectionClause>,
}

impl FlowSelection {
    pub fn eq(attr: impl Into<String>, value: impl Into<String>) -> Self {
        Self::is_in(attr, [value])
    }

    pub fn ne(attr: impl Into<String>, value: impl Into<String>) -> Self {
        Self::not_in(attr, [value])
    }

    pub fn is_in<I, V>(attr: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        Self {
            clauses: vec![SelectionClause {
                attr: attr.into(),
                values: values.into_iter().map(Into::into).collect(),
                negated: false,
            }],
        }
    }

    pub fn not_in<I, V>(attr: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        Self {
            clauses: vec![SelectionClause {
                attr: attr.into(),
                values: values.into_iter().map(Into::into).collect(),
                negated: true,
            }],
        }
    }

    /// Conjoins another selection onto this one.
    pub fn and(mut self, other: FlowSelection) -> Self {
        self.clauses.extend(other.clauses);
        self
    }
}

/// A declared route of flows from one node to another, possibly through
/// waypoints.
#[derive(Debug, Clone, PartialEq)]
pub struct Bundle {
    pub source: Endpoint,
    pub target: Endpoint,
    pub waypoints: Vec<String>,
    pub flow_selection: Option<FlowSelection>,
    pub flow_partition: Option<Partition>,
}

impl Bundle {
    pub fn new(source: impl Into<Endpoint>, target: impl Into<Endpoint>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            waypoints: Vec::new(),
            flow_selection: None,
            flow_partition: None,
        }
    }

    pub fn with_waypoints<I, S>(mut self, waypoints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.waypoints = waypoints.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_flow_selection(mut self, selection: FlowSelection) -> Self {
        self.flow_selection = Some(selection);
        self
    }

    /// Overrides the definition-level default flow partition for this bundle.
    pub fn with_flow_partition(mut self, partition: Partition) -> Self {
        self.flow_partition = Some(partition);
        self
    }

    pub fn from_elsewhere(&self) -> bool {
        self.source.is_elsewhere()
    }

    pub fn to_elsewhere(&self) -> bool {
        self.target.is_elsewhere()
    }
}
