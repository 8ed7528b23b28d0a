//! # Filter graph model
//!
//! Small AST for FFmpeg filter descriptions. Builders push typed nodes
//! (`filter name + params`, input labels, output label) and the graph is
//! rendered to FFmpeg's textual syntax only when the command line is built.
//!
//! Two renderings are supported:
//!
//! * [`FilterGraph`] - labelled nodes for `-filter_complex`
//!   (`[0:a]volume=0.7[voice];[voice]...[out]`)
//! * [`FilterChain`] - a linear list of filters for `-af`
//!   (`highpass=f=80,lowpass=f=15000`)

use std::fmt;

/// Filter parameter: either `key=value` or a bare positional value
#[derive(Debug, Clone, PartialEq)]
pub enum FilterParam {
    Named(String, String),
    Positional(String),
}

impl fmt::Display for FilterParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(key, value) => write!(f, "{}={}", key, value),
            Self::Positional(value) => f.write_str(value),
        }
    }
}

/// A single FFmpeg filter with its ordered parameters
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    name: String,
    params: Vec<FilterParam>,
}

impl Filter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
        }
    }

    /// Append a `key=value` parameter
    pub fn arg(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.push(FilterParam::Named(key.into(), value.to_string()));
        self
    }

    /// Append a numeric `key=value` parameter using compact formatting
    pub fn num(self, key: impl Into<String>, value: f64) -> Self {
        self.arg(key, format_number(value))
    }

    /// Append a positional parameter
    pub fn positional(mut self, value: impl ToString) -> Self {
        self.params.push(FilterParam::Positional(value.to_string()));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        for (i, param) in self.params.iter().enumerate() {
            f.write_str(if i == 0 { "=" } else { ":" })?;
            write!(f, "{}", param)?;
        }
        Ok(())
    }
}

/// Labelled node of a filter graph
#[derive(Debug, Clone, PartialEq)]
pub struct FilterNode {
    pub inputs: Vec<String>,
    pub filter: Filter,
    pub output: String,
}

impl fmt::Display for FilterNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for input in &self.inputs {
            write!(f, "[{}]", input)?;
        }
        write!(f, "{}[{}]", self.filter, self.output)
    }
}

/// Ordered list of labelled nodes, rendered for `-filter_complex`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterGraph {
    nodes: Vec<FilterNode>,
}

impl FilterGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a node reading `inputs` and writing `output`
    pub fn push<I, S>(&mut self, inputs: I, filter: Filter, output: impl Into<String>) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.nodes.push(FilterNode {
            inputs: inputs.into_iter().map(Into::into).collect(),
            filter,
            output: output.into(),
        });
        self
    }

    /// Filter names in graph order
    pub fn filter_names(&self) -> Vec<&str> {
        self.nodes.iter().map(|n| n.filter.name()).collect()
    }

    /// Label of the terminal node
    pub fn output_label(&self) -> Option<&str> {
        self.nodes.last().map(|n| n.output.as_str())
    }

    /// `-map` argument selecting the terminal output
    pub fn map_target(&self) -> Option<String> {
        self.output_label().map(|label| format!("[{}]", label))
    }
}

impl fmt::Display for FilterGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, node) in self.nodes.iter().enumerate() {
            if i > 0 {
                f.write_str(";")?;
            }
            write!(f, "{}", node)?;
        }
        Ok(())
    }
}

/// Linear filter chain, rendered for `-af`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterChain {
    filters: Vec<Filter>,
}

impl FilterChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn filter_names(&self) -> Vec<&str> {
        self.filters.iter().map(Filter::name).collect()
    }
}

impl fmt::Display for FilterChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, filter) in self.filters.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", filter)?;
        }
        Ok(())
    }
}

/// Compact decimal rendering: at most 6 fractional digits, no trailing zeros.
/// Values that would round to zero keep their full precision.
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    let rounded = format!("{:.6}", value);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    match trimmed {
        // ненулевое значение не должно превращаться в 0 (volume=0 это тишина)
        "-0" | "0" | "" => value.to_string(),
        other => other.to_string(),
    }
}
