//! Integration tests for graph connection and decoding attachment.

use std::sync::Arc;

use tk_connect::{
    Alignment, ConnectError, ConnectOptions, PortMapping, add_greedy_decoding, connect_models,
};
use tk_graph::ops::{Add, Convert};
use tk_graph::{
    Dimension, ElementType, Graph, GraphBuilder, GraphError, PartialShape, TensorDesc, ValueRef,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

fn f32_desc() -> TensorDesc {
    TensorDesc::new(ElementType::F32, PartialShape::fixed(&[2, 3]))
}

/// Graph with input `x` and one `Convert` output per name.
fn producer(name: &str, outputs: &[&str]) -> Graph {
    let mut builder = GraphBuilder::new(name);
    let x = builder.add_parameter("x", f32_desc()).unwrap();
    for &out in outputs {
        let cast = builder
            .add_op(
                format!("{out}/cast"),
                Arc::new(Convert::new(ElementType::F32).unwrap()),
                [ValueRef::new(x, 0)],
            )
            .unwrap();
        builder.add_tensor_names(ValueRef::new(cast, 0), [out]).unwrap();
        builder.add_result(ValueRef::new(cast, 0)).unwrap();
    }
    builder.build().unwrap()
}

/// Graph whose output `j` adds inputs `j` and `j + 1` (wrapping).
fn consumer(name: &str, inputs: &[&str], outputs: &[&str]) -> Graph {
    let mut builder = GraphBuilder::new(name);
    let params: Vec<_> = inputs
        .iter()
        .map(|&i| builder.add_parameter(i, f32_desc()).unwrap())
        .collect();
    for (j, &out) in outputs.iter().enumerate() {
        let lhs = ValueRef::new(params[j % params.len()], 0);
        let rhs = ValueRef::new(params[(j + 1) % params.len()], 0);
        let sum = builder.add_op(format!("{out}/add"), Arc::new(Add), [lhs, rhs]).unwrap();
        builder.add_tensor_names(ValueRef::new(sum, 0), [out]).unwrap();
        builder.add_result(ValueRef::new(sum, 0)).unwrap();
    }
    builder.build().unwrap()
}

fn input_names(graph: &Graph) -> Vec<String> {
    graph
        .inputs()
        .map(|p| graph.input_display_name(&p).to_string())
        .collect()
}

fn output_names(graph: &Graph) -> Vec<String> {
    graph
        .outputs()
        .map(|p| graph.output_display_name(&p).to_string())
        .collect()
}

#[test]
fn by_name_pairs_every_output() {
    init_tracing();
    let first = producer("encoder", &["a", "b"]);
    let second = consumer("head", &["b", "a"], &["y"]);

    let joined = connect_models(&first, &second, &ConnectOptions::default()).unwrap();
    assert_eq!(joined.name(), "encoder_with_head");
    assert_eq!(input_names(&joined), vec!["x"]);
    assert_eq!(output_names(&joined), vec!["y"]);

    // The add reads the casts directly, with no parameters left in between
    let add = joined.nodes().iter().find(|n| n.name == "y/add").unwrap();
    for input in &add.inputs {
        let producer = joined.node(input.node).unwrap();
        assert_eq!(producer.kind.type_name(), "Convert");
    }
    let params = joined
        .nodes()
        .iter()
        .filter(|n| n.kind.is_parameter())
        .count();
    assert_eq!(params, 1);
}

#[test]
fn by_name_fails_on_missing_input() {
    let first = producer("encoder", &["a", "extra"]);
    let second = consumer("head", &["a"], &["y"]);
    let err = connect_models(&first, &second, &ConnectOptions::default()).unwrap_err();
    assert_eq!(
        err,
        ConnectError::UnknownInput {
            graph: "head".into(),
            name: "extra".into()
        }
    );
}

#[test]
fn by_indices_aligns_common_prefix() {
    init_tracing();
    let first = producer("m1", &["o0", "o1", "o2"]);
    let second = consumer("m2", &["i0", "i1"], &["y"]);

    let joined = connect_models(&first, &second, &ConnectOptions::by_indices()).unwrap();
    assert_eq!(input_names(&joined), vec!["x"]);
    assert_eq!(output_names(&joined), vec!["y"]);
    assert!(joined.nodes().iter().all(|n| n.name != "o2/cast"));

    let options = ConnectOptions {
        keep_unaligned_first_outputs: true,
        ..ConnectOptions::by_indices()
    };
    let joined = connect_models(&first, &second, &options).unwrap();
    assert_eq!(output_names(&joined), vec!["y", "o2"]);
}

#[test]
fn by_indices_ignores_names() {
    let first = producer("m1", &["left", "right"]);
    let second = consumer("m2", &["p", "q"], &["y"]);
    let joined = connect_models(&first, &second, &ConnectOptions::by_indices()).unwrap();
    assert_eq!(output_names(&joined), vec!["y"]);
}

#[test]
fn explicit_mapping_connects_only_listed_pair() {
    init_tracing();
    let first = producer("lm", &["logits", "hidden"]);
    let second = consumer("decoder", &["decoder_in", "hidden"], &["y"]);
    let mapping = PortMapping::from_map([("logits", "decoder_in")]).unwrap();

    let joined = connect_models(&first, &second, &ConnectOptions::explicit(mapping.clone())).unwrap();
    assert_eq!(input_names(&joined), vec!["x", "hidden"]);
    assert_eq!(output_names(&joined), vec!["y"]);

    // `hidden` of the decoder stays a parameter despite the matching output name
    let add = joined.nodes().iter().find(|n| n.name == "y/add").unwrap();
    let kinds: Vec<&str> = add
        .inputs
        .iter()
        .map(|v| joined.node(v.node).unwrap().kind.type_name())
        .collect();
    assert_eq!(kinds, vec!["Convert", "Parameter"]);

    let options = ConnectOptions {
        alignment: Alignment::Explicit(mapping),
        keep_unaligned_first_outputs: true,
        keep_unaligned_second_inputs: true,
    };
    let joined = connect_models(&first, &second, &options).unwrap();
    assert_eq!(output_names(&joined), vec!["y", "hidden"]);
}

#[test]
fn dropping_a_needed_input_fails_validation() {
    let first = producer("lm", &["logits"]);
    let second = consumer("decoder", &["decoder_in", "mask"], &["y"]);
    let options = ConnectOptions {
        alignment: Alignment::Explicit(PortMapping::from_pairs([("logits", "decoder_in")])),
        keep_unaligned_second_inputs: false,
        keep_unaligned_first_outputs: false,
    };
    let err = connect_models(&first, &second, &options).unwrap_err();
    assert_eq!(
        err,
        ConnectError::Graph(GraphError::UndeclaredParameter {
            name: "mask".into()
        })
    );
}

#[test]
fn fan_out_rewires_every_consumer() {
    let first = producer("m1", &["h"]);
    // `h` feeds both inputs of one add and a second add
    let mut builder = GraphBuilder::new("m2");
    let h = builder.add_parameter("h", f32_desc()).unwrap();
    let a = builder
        .add_op("a", Arc::new(Add), [ValueRef::new(h, 0), ValueRef::new(h, 0)])
        .unwrap();
    let b = builder
        .add_op("b", Arc::new(Add), [ValueRef::new(a, 0), ValueRef::new(h, 0)])
        .unwrap();
    builder.add_tensor_names(ValueRef::new(b, 0), ["y"]).unwrap();
    builder.add_result(ValueRef::new(b, 0)).unwrap();
    let second = builder.build().unwrap();

    let joined = connect_models(&first, &second, &ConnectOptions::default()).unwrap();
    let cast = joined.nodes().iter().find(|n| n.name == "h/cast").unwrap();
    assert_eq!(joined.consumers(ValueRef::new(cast.id, 0)).len(), 3);
}

#[test]
fn unknown_input_in_mapping_leaves_first_usable() {
    let first = producer("lm", &["logits"]);
    let second = consumer("decoder", &["decoder_in"], &["y"]);
    let before = format!("{first:?}");

    let mapping = PortMapping::from_pairs([("logits", "nonexistent")]);
    let err = connect_models(&first, &second, &ConnectOptions::explicit(mapping)).unwrap_err();
    assert!(matches!(err, ConnectError::UnknownInput { ref name, .. } if name == "nonexistent"));
    assert_eq!(format!("{first:?}"), before);

    let mapping = PortMapping::from_pairs([("logits", "decoder_in")]);
    assert!(connect_models(&first, &second, &ConnectOptions::explicit(mapping)).is_ok());
}

#[test]
fn unknown_output_in_mapping() {
    let first = producer("lm", &["logits"]);
    let second = consumer("decoder", &["decoder_in"], &["y"]);
    let mapping = PortMapping::from_pairs([("scores", "decoder_in")]);
    let err = connect_models(&first, &second, &ConnectOptions::explicit(mapping)).unwrap_err();
    assert_eq!(
        err,
        ConnectError::UnknownOutput {
            graph: "lm".into(),
            name: "scores".into()
        }
    );
}

#[test]
fn two_outputs_into_one_input_rejected() {
    let first = producer("lm", &["a", "b"]);
    let second = consumer("decoder", &["in"], &["y"]);
    let mapping = PortMapping::from_pairs([("a", "in"), ("b", "in")]);
    let err = connect_models(&first, &second, &ConnectOptions::explicit(mapping)).unwrap_err();
    assert_eq!(err, ConnectError::DuplicateInput { name: "in".into() });
}

/// Graph with input `x` whose one `Convert` tensor `h` is exposed twice.
fn doubled_output() -> Graph {
    let mut builder = GraphBuilder::new("m1");
    let x = builder.add_parameter("x", f32_desc()).unwrap();
    let cast = builder
        .add_op(
            "h/cast",
            Arc::new(Convert::new(ElementType::F32).unwrap()),
            [ValueRef::new(x, 0)],
        )
        .unwrap();
    builder.add_tensor_names(ValueRef::new(cast, 0), ["h"]).unwrap();
    builder.add_result(ValueRef::new(cast, 0)).unwrap();
    builder.add_result(ValueRef::new(cast, 0)).unwrap();
    builder.build().unwrap()
}

#[test]
fn same_tensor_twice_into_one_input() {
    init_tracing();
    let first = doubled_output();
    let second = consumer("m2", &["h"], &["y"]);

    let joined = connect_models(&first, &second, &ConnectOptions::default()).unwrap();
    assert_eq!(input_names(&joined), vec!["x"]);
    assert_eq!(output_names(&joined), vec!["y"]);
    let cast = joined.nodes().iter().find(|n| n.name == "h/cast").unwrap();
    assert_eq!(joined.consumers(ValueRef::new(cast.id, 0)).len(), 2);

    // Both results count as aligned, so neither is kept
    let options = ConnectOptions {
        keep_unaligned_first_outputs: true,
        ..ConnectOptions::default()
    };
    let joined = connect_models(&first, &second, &options).unwrap();
    assert_eq!(output_names(&joined), vec!["y"]);

    let mapping = PortMapping::from_pairs([("h", "h"), ("h", "h")]);
    let joined = connect_models(&first, &second, &ConnectOptions::explicit(mapping)).unwrap();
    assert_eq!(output_names(&joined), vec!["y"]);
}

#[test]
fn shared_unaligned_input_name_rejected() {
    let first = producer("m1", &["h"]);
    let second = consumer("m2", &["h", "x"], &["y"]);
    let err = connect_models(&first, &second, &ConnectOptions::default()).unwrap_err();
    assert_eq!(
        err,
        ConnectError::Graph(GraphError::DuplicateInputName { name: "x".into() })
    );

    // Splicing the second graph's `x` away resolves the clash
    let mapping = PortMapping::from_pairs([("h", "h"), ("h", "x")]);
    let joined = connect_models(&first, &second, &ConnectOptions::explicit(mapping)).unwrap();
    assert_eq!(input_names(&joined), vec!["x"]);
}

#[test]
fn incompatible_descriptors_rejected() {
    let first = producer("lm", &["logits"]);
    let mut builder = GraphBuilder::new("decoder");
    let ids = builder
        .add_parameter(
            "logits",
            TensorDesc::new(ElementType::I64, PartialShape::fixed(&[2, 3])),
        )
        .unwrap();
    builder.add_result(ValueRef::new(ids, 0)).unwrap();
    let second = builder.build().unwrap();

    match connect_models(&first, &second, &ConnectOptions::default()).unwrap_err() {
        ConnectError::SpliceMismatch {
            output,
            input,
            produced,
            expected,
        } => {
            assert_eq!(output, "logits");
            assert_eq!(input, "logits");
            assert_eq!(produced.element_type, ElementType::F32);
            assert_eq!(expected.element_type, ElementType::I64);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn repeated_calls_are_deterministic() {
    let first = producer("m1", &["a", "b", "c"]);
    let second = consumer("m2", &["a", "b", "c"], &["y", "z"]);
    let one = connect_models(&first, &second, &ConnectOptions::default()).unwrap();
    let two = connect_models(&first, &second, &ConnectOptions::default()).unwrap();
    assert_eq!(format!("{one:?}"), format!("{two:?}"));
}

fn logits_model(shape: PartialShape) -> Graph {
    let mut builder = GraphBuilder::new("lm");
    let hidden = builder
        .add_parameter("hidden", TensorDesc::new(ElementType::F16, shape))
        .unwrap();
    let logits = builder
        .add_op(
            "upcast",
            Arc::new(Convert::new(ElementType::F32).unwrap()),
            [ValueRef::new(hidden, 0)],
        )
        .unwrap();
    builder.add_tensor_names(ValueRef::new(logits, 0), ["logits"]).unwrap();
    builder.add_result(ValueRef::new(logits, 0)).unwrap();
    let past = builder
        .add_op(
            "past",
            Arc::new(Convert::new(ElementType::F16).unwrap()),
            [ValueRef::new(hidden, 0)],
        )
        .unwrap();
    builder.add_tensor_names(ValueRef::new(past, 0), ["present"]).unwrap();
    builder.add_result(ValueRef::new(past, 0)).unwrap();
    builder.build().unwrap()
}

#[test]
fn greedy_decoding_static_logits() {
    init_tracing();
    let model = logits_model(PartialShape::fixed(&[2, 5, 100]));
    let decoded = add_greedy_decoding(&model, "logits").unwrap();

    assert_eq!(decoded.name(), "lm_with_greedy_decoder");
    assert_eq!(input_names(&decoded), vec!["hidden"]);
    assert_eq!(output_names(&decoded), vec!["token_ids", "present"]);

    let token_ids = decoded.output("token_ids").unwrap();
    assert_eq!(
        decoded.output_desc(&token_ids),
        &TensorDesc::new(ElementType::I32, PartialShape::fixed(&[2, 5]))
    );
}

#[test]
fn greedy_decoding_dynamic_logits() {
    let model = logits_model(PartialShape::new([
        Dimension::Dynamic,
        Dimension::Dynamic,
        Dimension::Static(32_000),
    ]));
    let decoded = add_greedy_decoding(&model, "logits").unwrap();
    let token_ids = decoded.output("token_ids").unwrap();
    assert_eq!(
        decoded.output_desc(&token_ids),
        &TensorDesc::new(ElementType::I32, PartialShape::with_rank(2))
    );
}

#[test]
fn greedy_decoding_rejects_wrong_rank() {
    let model = logits_model(PartialShape::fixed(&[5, 100]));
    let err = add_greedy_decoding(&model, "logits").unwrap_err();
    assert!(matches!(err, ConnectError::SpliceMismatch { .. }));

    let model = logits_model(PartialShape::fixed(&[1, 5, 100]));
    let err = add_greedy_decoding(&model, "scores").unwrap_err();
    assert!(matches!(err, ConnectError::UnknownOutput { .. }));
}

mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn index_alignment_port_counts(
            n_out in 1usize..5,
            n_in in 1usize..5,
            keep_first in any::<bool>(),
        ) {
            let outs: Vec<String> = (0..n_out).map(|i| format!("o{i}")).collect();
            let ins: Vec<String> = (0..n_in).map(|i| format!("i{i}")).collect();
            let outs: Vec<&str> = outs.iter().map(String::as_str).collect();
            let ins: Vec<&str> = ins.iter().map(String::as_str).collect();

            let first = producer("m1", &outs);
            let second = consumer("m2", &ins, &["y"]);
            let options = ConnectOptions {
                keep_unaligned_first_outputs: keep_first,
                ..ConnectOptions::by_indices()
            };
            let joined = connect_models(&first, &second, &options).unwrap();

            let aligned = n_out.min(n_in);
            prop_assert_eq!(joined.input_count(), 1 + (n_in - aligned));
            let expected_outputs = if keep_first { 1 + n_out - aligned } else { 1 };
            prop_assert_eq!(joined.output_count(), expected_outputs);
            prop_assert_eq!(&output_names(&joined)[0], "y");
        }
    }
}
