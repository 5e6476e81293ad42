/// Builds a streamed chat completions response body from pre-serialized
/// chunks, terminated with the [DONE] sentinel the way OpenAI-compatible
/// APIs terminate their streams.
pub fn sse_completion_body(chunks: &[String]) -> String {
    let mut frames: Vec<String> = chunks
        .iter()
        .map(|chunk| {
            return format!("data: {chunk}");
        })
        .collect();
    frames.push("data: [DONE]".to_string());

    return frames.join("\n\n");
}
