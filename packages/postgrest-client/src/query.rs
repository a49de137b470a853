//! Row filters, ordering and limits, rendered as PostgREST query parameters.

/// Sort direction for [`Query::order_by`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

impl Order {
    fn as_str(self) -> &'static str {
        match self {
            Order::Asc => "asc",
            Order::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Condition {
    Eq(String),
    In(Vec<String>),
}

/// Equality-only row predicate plus optional ordering and limit.
///
/// ```rust,ignore
/// let query = Query::new()
///     .eq("job_id", job_id)
///     .order_by("created_at", Order::Asc)
///     .limit(20);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    conditions: Vec<(String, Condition)>,
    order: Option<(String, Order)>,
    limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Match rows where `column` equals `value`.
    pub fn eq(mut self, column: &str, value: impl ToString) -> Self {
        self.conditions
            .push((column.to_string(), Condition::Eq(value.to_string())));
        self
    }

    /// Match rows where `column` equals any of `values`.
    pub fn in_list<I, V>(mut self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: ToString,
    {
        let values = values.into_iter().map(|v| v.to_string()).collect();
        self.conditions
            .push((column.to_string(), Condition::In(values)));
        self
    }

    pub fn order_by(mut self, column: &str, order: Order) -> Self {
        self.order = Some((column.to_string(), order));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether the query carries at least one row predicate.
    ///
    /// PostgREST refuses unfiltered PATCH requests in most deployments, so
    /// updates check this before sending.
    pub fn has_filter(&self) -> bool {
        !self.conditions.is_empty()
    }

    /// Render as `(key, value)` pairs for `reqwest::RequestBuilder::query`.
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params: Vec<(String, String)> = self
            .conditions
            .iter()
            .map(|(column, condition)| {
                let value = match condition {
                    Condition::Eq(value) => format!("eq.{}", value),
                    Condition::In(values) => {
                        let quoted: Vec<String> = values
                            .iter()
                            .map(|v| format!("\"{}\"", v.replace('"', "\\\"")))
                            .collect();
                        format!("in.({})", quoted.join(","))
                    }
                };
                (column.clone(), value)
            })
            .collect();

        if let Some((column, order)) = &self.order {
            params.push(("order".to_string(), format!("{}.{}", column, order.as_str())));
        }
        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        params
    }
}
