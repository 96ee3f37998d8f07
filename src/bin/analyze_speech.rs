use std::io::Read;

use serde::Serialize;
use voxpopuli_lib::models::{AnalysisOutcome, NamedEntity};
use voxpopuli_lib::services::page::summary_lines;
use voxpopuli_lib::services::text_processor::{split_sentences, word_count};
use voxpopuli_lib::services::SAMPLE_SPEECH;

fn preview(s: &str, max_chars: usize) -> String {
    let mut out: String = s.chars().take(max_chars).collect();
    if s.chars().count() > max_chars {
        out.push_str("...");
    }
    out.replace('\n', " ")
}

fn parse_arg_value(args: &[String], key: &str) -> Option<String> {
    args.iter()
        .position(|a| a == key)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn has_flag(args: &[String], key: &str) -> bool {
    args.iter().any(|a| a == key)
}

fn read_input(path: &str) -> Result<String, String> {
    if path == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| format!("read stdin failed: {}", e))?;
        Ok(buf)
    } else {
        std::fs::read_to_string(path).map_err(|e| format!("read file failed: {}", e))
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Output {
    source: String,
    words: usize,
    sentences: usize,
    outcome: AnalysisOutcome,
}

#[tokio::main]
async fn main() -> Result<(), String> {
    let args: Vec<String> = std::env::args().collect();
    let use_sample = has_flag(&args, "--sample");
    let as_json = has_flag(&args, "--json");
    let out_path = parse_arg_value(&args, "--out");

    let path = args.get(1).filter(|a| !a.starts_with("--")).cloned();
    if path.is_none() && !use_sample {
        eprintln!(
            "Usage:\n  cargo run --bin analyze_speech -- <path.txt|-> [--json] [--out <json_path>]\n  cargo run --bin analyze_speech -- --sample [--json]\n\nNotes:\n  - `-` reads the speech from stdin.\n  - `--sample` analyzes the built-in sample speech.\n  - Models are read from (and installed into) the configured model directory."
        );
        return Ok(());
    }

    let (source, text) = match path {
        Some(p) if !use_sample => (p.clone(), read_input(&p)?),
        _ => ("(sample)".to_string(), SAMPLE_SPEECH.to_string()),
    };

    let config = voxpopuli_lib::load_config();
    let analyzer = voxpopuli_lib::build_analyzer(&config)
        .await
        .map_err(|e| format!("{:#}", e))?;

    let outcome = analyzer.analyze(&text).await;
    let output = Output {
        source,
        words: word_count(&text),
        sentences: split_sentences(&text).len(),
        outcome,
    };

    if as_json {
        let json = serde_json::to_string_pretty(&output).map_err(|e| e.to_string())?;
        println!("{}", json);
    } else {
        println!("Input: {}", output.source);
        println!("Words: {}  Sentences: {}", output.words, output.sentences);
        println!("Preview: {}", preview(&text, 120));
        println!();
        match &output.outcome {
            AnalysisOutcome::Analyzed(analysis) => {
                for line in summary_lines(analysis) {
                    println!("{}", line);
                }
                print_entities(&analysis.entities);
            }
            AnalysisOutcome::Warning { message } => println!("⚠️ {}", message),
        }
    }

    if let Some(out_path) = out_path {
        let json = serde_json::to_string_pretty(&output).map_err(|e| e.to_string())?;
        std::fs::write(&out_path, json).map_err(|e| format!("write out failed: {}", e))?;
        if !as_json {
            println!();
            println!("Wrote JSON: {}", out_path);
        }
    }

    Ok(())
}

fn print_entities(entities: &[NamedEntity]) {
    if entities.is_empty() {
        return;
    }
    println!();
    for e in entities {
        println!("[{:>6}] bytes=[{},{}]  {}", e.label, e.start, e.end, e.text);
    }
}
