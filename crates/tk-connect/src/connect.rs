//! Connecting the outputs of one graph to the inputs of another.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use tk_graph::{Graph, GraphBuilder, GraphError, InputPort, OutputPort, ValueRef};

use crate::error::{ConnectError, ConnectResult};

/// Ordered `(output name, input name)` pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortMapping {
    pairs: Vec<(String, String)>,
}

impl PortMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mapping from a pair sequence; an output may feed several inputs.
    pub fn from_pairs<O, I>(pairs: impl IntoIterator<Item = (O, I)>) -> Self
    where
        O: Into<String>,
        I: Into<String>,
    {
        let mut mapping = Self::new();
        for (output, input) in pairs {
            mapping.push(output, input);
        }
        mapping
    }

    /// Mapping keyed by output name; fails if a key repeats.
    pub fn from_map<O, I>(entries: impl IntoIterator<Item = (O, I)>) -> ConnectResult<Self>
    where
        O: Into<String>,
        I: Into<String>,
    {
        let mut mapping = Self::new();
        for (output, input) in entries {
            mapping.insert(output, input)?;
        }
        Ok(mapping)
    }

    /// Append a pair without checking for repeats.
    pub fn push(&mut self, output: impl Into<String>, input: impl Into<String>) {
        self.pairs.push((output.into(), input.into()));
    }

    /// Append a pair whose output name must not be mapped yet.
    pub fn insert(&mut self, output: impl Into<String>, input: impl Into<String>) -> ConnectResult<()> {
        let output = output.into();
        if self.pairs.iter().any(|(o, _)| *o == output) {
            return Err(ConnectError::DuplicateKey { key: output });
        }
        self.pairs.push((output, input.into()));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(o, i)| (o.as_str(), i.as_str()))
    }
}

impl<O: Into<String>, I: Into<String>> FromIterator<(O, I)> for PortMapping {
    fn from_iter<T: IntoIterator<Item = (O, I)>>(iter: T) -> Self {
        Self::from_pairs(iter)
    }
}

/// How outputs of the first graph are paired with inputs of the second.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Alignment {
    /// Each output's name must name an input.
    #[default]
    ByName,
    Explicit(PortMapping),
    /// Output `i` feeds input `i` for every index both graphs have.
    ByIndices,
}

/// Options for [`connect_models`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectOptions {
    pub alignment: Alignment,
    /// Expose inputs of the second graph that nothing feeds.
    pub keep_unaligned_second_inputs: bool,
    /// Expose outputs of the first graph that feed nothing.
    pub keep_unaligned_first_outputs: bool,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            alignment: Alignment::ByName,
            keep_unaligned_second_inputs: true,
            keep_unaligned_first_outputs: false,
        }
    }
}

impl ConnectOptions {
    pub fn by_indices() -> Self {
        Self {
            alignment: Alignment::ByIndices,
            ..Self::default()
        }
    }

    pub fn explicit(mapping: PortMapping) -> Self {
        Self {
            alignment: Alignment::Explicit(mapping),
            ..Self::default()
        }
    }
}

/// An output of the first graph paired with an input of the second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlignedPair {
    pub output: OutputPort,
    pub input: InputPort,
}

/// Resolve `alignment` to concrete port pairs, in alignment order.
///
/// An input of `second` may appear in several pairs only if every one of them
/// names the same tensor of `first`; the repeats rewire nothing.
pub fn resolve_alignment(
    first: &Graph,
    second: &Graph,
    alignment: &Alignment,
) -> ConnectResult<Vec<AlignedPair>> {
    let pairs = match alignment {
        Alignment::ByName => first
            .outputs()
            .map(|output| {
                let input = lookup_input(second, first.output_display_name(&output))?;
                Ok(AlignedPair { output, input })
            })
            .collect::<ConnectResult<Vec<_>>>()?,
        Alignment::Explicit(mapping) => mapping
            .iter()
            .map(|(output, input)| {
                Ok(AlignedPair {
                    output: lookup_output(first, output)?,
                    input: lookup_input(second, input)?,
                })
            })
            .collect::<ConnectResult<Vec<_>>>()?,
        Alignment::ByIndices => first
            .outputs()
            .zip(second.inputs())
            .map(|(output, input)| AlignedPair { output, input })
            .collect(),
    };

    let mut targeted: HashMap<usize, ValueRef> = HashMap::new();
    for pair in &pairs {
        match targeted.entry(pair.input.index) {
            Entry::Vacant(slot) => {
                slot.insert(pair.output.source);
            }
            Entry::Occupied(slot) if *slot.get() == pair.output.source => {}
            Entry::Occupied(_) => {
                return Err(ConnectError::DuplicateInput {
                    name: second.input_display_name(&pair.input).to_string(),
                });
            }
        }
    }
    Ok(pairs)
}

fn lookup_input(graph: &Graph, name: &str) -> ConnectResult<InputPort> {
    graph.input(name).map_err(|err| match err {
        GraphError::UnknownInput { graph, name } => ConnectError::UnknownInput { graph, name },
        other => other.into(),
    })
}

fn lookup_output(graph: &Graph, name: &str) -> ConnectResult<OutputPort> {
    graph.output(name).map_err(|err| match err {
        GraphError::UnknownOutput { graph, name } => ConnectError::UnknownOutput { graph, name },
        other => other.into(),
    })
}

/// Feed outputs of `first` into inputs of `second`, producing a new graph
/// named `"{first}_with_{second}"`.
///
/// Every consumer of an aligned input is rewired to the producer of the paired
/// output. The composite's inputs are those of `first` followed by the kept
/// unaligned inputs of `second`; its outputs are those of `second` followed by
/// the kept unaligned outputs of `first`. Both arguments are left untouched.
///
/// # Errors
///
/// Fails before any rewiring if a port cannot be resolved, and on the first
/// pair whose descriptors are incompatible. Validation and type inference of
/// the composite can fail with [`ConnectError::Graph`].
pub fn connect_models(
    first: &Graph,
    second: &Graph,
    options: &ConnectOptions,
) -> ConnectResult<Graph> {
    let pairs = resolve_alignment(first, second, &options.alignment)?;

    let mut builder = GraphBuilder::new(format!("{}_with_{}", first.name(), second.name()));
    let first_map = builder.import(first)?;
    let second_map = builder.import(second)?;

    for pair in &pairs {
        let output_name = first.output_display_name(&pair.output);
        let input_name = second.input_display_name(&pair.input);
        let produced = first.output_desc(&pair.output);
        let expected = second.input_desc(&pair.input);
        if !produced.compatible(expected) {
            return Err(ConnectError::SpliceMismatch {
                output: output_name.to_string(),
                input: input_name.to_string(),
                produced: produced.clone(),
                expected: expected.clone(),
            });
        }

        let source = first_map.value(pair.output.source);
        for consumer in builder.consumers_of(second_map.value(pair.input.value())) {
            builder.replace_source(consumer, source)?;
        }
        tracing::debug!(output = %output_name, input = %input_name, "connected ports");
    }

    for &param in first.parameters() {
        builder.declare_input(first_map.node(param))?;
    }
    let aligned_inputs: HashSet<usize> = pairs.iter().map(|p| p.input.index).collect();
    let unaligned_inputs: Vec<InputPort> = second
        .inputs()
        .filter(|port| !aligned_inputs.contains(&port.index))
        .collect();
    if options.keep_unaligned_second_inputs {
        for port in &unaligned_inputs {
            builder.declare_input(second_map.node(port.node))?;
        }
    } else if !unaligned_inputs.is_empty() {
        let names: Vec<&str> = unaligned_inputs
            .iter()
            .map(|port| second.input_display_name(port))
            .collect();
        tracing::info!(graph = %second.name(), inputs = ?names, "dropping unaligned inputs");
    }

    for &result in second.results() {
        builder.declare_output(second_map.node(result))?;
    }
    let aligned_outputs: HashSet<usize> = pairs.iter().map(|p| p.output.index).collect();
    let unaligned_outputs: Vec<OutputPort> = first
        .outputs()
        .filter(|port| !aligned_outputs.contains(&port.index))
        .collect();
    if options.keep_unaligned_first_outputs {
        for port in &unaligned_outputs {
            builder.declare_output(first_map.node(port.result))?;
        }
    } else if !unaligned_outputs.is_empty() {
        let names: Vec<&str> = unaligned_outputs
            .iter()
            .map(|port| first.output_display_name(port))
            .collect();
        tracing::info!(graph = %first.name(), outputs = ?names, "dropping unaligned outputs");
    }

    Ok(builder.build()?)
}
