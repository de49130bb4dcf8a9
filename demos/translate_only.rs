//! Demonstrate the translation layer without a server.
//!
//! Usage:
//!   `cargo run --example translate_only`

use deepseek_gateway::models::ModelMapping;
use deepseek_gateway::translate::request::translate_request;
use deepseek_gateway::translate::response::relay_buffered;
use deepseek_gateway::translate::streaming::SseReframer;

fn main() -> anyhow::Result<()> {
    let mapping = ModelMapping::default();

    // 1. Inbound OpenAI-style request
    let body = serde_json::json!({
        "model": "gpt-4",
        "messages": [{"role": "user", "content": "What is 6 x 7?"}],
    });
    let req = translate_request(
        Some("Bearer sk-demo"),
        &serde_json::to_vec(&body)?,
        &mapping,
        "gpt-3.5-turbo",
    )?;

    println!("=== Upstream request ===");
    println!("{}", serde_json::to_string_pretty(&req.upstream)?);

    // 2. Simulated DeepSeek reply
    let upstream = serde_json::json!({
        "id": "ds-1",
        "model": "deepseek-reasoner",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": "42", "reasoning_content": "6 x 7 = 42"},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 12, "completion_tokens": 8, "total_tokens": 20}
    });
    let reply = relay_buffered(
        200,
        &serde_json::to_vec(&upstream)?,
        &req.caller_model,
        req.upstream_model(),
        false,
    )?;

    println!("\n=== Caller response ===");
    println!("{}", serde_json::to_string_pretty(&reply.to_json())?);

    // 3. Streaming chunks split mid-line
    let mut reframer = SseReframer::new();
    let chunks: [&[u8]; 3] = [
        b"data: {\"choices\":[{\"delta\":{\"content\":\"4\"}}]}\nda",
        b"ta: {\"choices\":[{\"delta\":{\"content\":\"2\"}}]}\n\n",
        b"data: [DONE]\n\n",
    ];

    println!("\n=== SSE frames ===");
    for chunk in chunks {
        for frame in reframer.push(chunk) {
            print!("{frame}");
        }
    }
    for frame in reframer.finish() {
        print!("{frame}");
    }

    Ok(())
}
