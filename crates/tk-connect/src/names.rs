//! Well-known tensor and graph names.

/// Input of the greedy decoder, and the usual name of a model's logits output.
pub const LOGITS_OUTPUT_NAME: &str = "logits";

/// Output of the greedy decoder.
pub const TOKEN_IDS_OUTPUT_NAME: &str = "token_ids";

/// Name of the graph built by `greedy_decoding_graph`.
pub const GREEDY_DECODER_NAME: &str = "greedy_decoder";
