/// One labelled bucket of a [`Partition`].
///
/// The query lists, per dimension, which values fall into this bucket. The
/// reserved dimension `process` is resolved against the source or target
/// column depending on which end of a segment the partition sits on.
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionGroup {
    pub label: String,
    pub query: Vec<(String, Vec<String>)>,
}

impl PartitionGroup {
    pub fn new<S, I, V>(label: S, dimension: S, values: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        Self {
            label: label.into(),
            query: vec![(
                dimension.into(),
                values.into_iter().map(Into::into).collect(),
            )],
        }
    }
}

/// An ordered list of labelled value groups over one or more dimensions.
///
/// Values not claimed by any group fall into an implicit residual bucket
/// labelled `_` when the partition is expanded.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Partition {
    pub groups: Vec<PartitionGroup>,
}

impl Partition {
    pub fn new(groups: Vec<PartitionGroup>) -> Self {
        Self { groups }
    }

    /// One group per value, labelled by the value itself.
    pub fn simple<S, I, V>(dimension: S, values: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        let dimension = dimension.into();
        let groups = values
            .into_iter()
            .map(|v| {
                let v = v.into();
                PartitionGroup {
                    label: v.clone(),
                    query: vec![(dimension.clone(), vec![v])],
                }
            })
            .collect();
        Self { groups }
    }

    /// Explicitly labelled groups over a single dimension.
    pub fn grouped<S, I, L, V, W>(dimension: S, groups: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = (L, V)>,
        L: Into<String>,
        V: IntoIterator<Item = W>,
        W: Into<String>,
    {
        let dimension = dimension.into();
        let groups = groups
            .into_iter()
            .map(|(label, values)| PartitionGroup {
                label: label.into(),
                query: vec![(
                    dimension.clone(),
                    values.into_iter().map(Into::into).collect(),
                )],
            })
            .collect();
        Self { groups }
    }

    /// Group labels in declaration order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|g| g.label.as_str())
    }
}
