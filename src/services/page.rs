// Page Rendering
// Full-page HTML for each interaction: chrome, input form, result panel or warning

use crate::models::{AnalysisOutcome, SpeechAnalysis};

pub const PAGE_TITLE: &str = "VoxPopuli: Speech Analyzer";
pub const TAGLINE: &str = "Clarity in action: Transparency for a better future.";
pub const NO_ENTITIES: &str = "No named entities found.";

const FLAG_STYLE: &str = r#"
body { font-family: "Source Sans Pro", sans-serif; margin: 0; display: flex; min-height: 100vh; }
.sidebar { width: 300px; background: #f0f2f6; padding: 24px; box-sizing: border-box; }
.main { flex: 1; background-color: #ffffff; padding: 32px 48px; }
.big-title { font-size: 2.5em; color: #138808; font-weight: bold; }
.tagline { color: #ff9933; font-size: 1.2em; }
.section-header { color: #054187; font-weight: bold; margin-top: 24px; }
.info { background: #e8f0fe; border-radius: 6px; padding: 12px; }
.success { background: #e6f4ea; border-radius: 6px; padding: 12px; }
.warning { background: #fff4e5; border-left: 4px solid #ff9933; border-radius: 6px; padding: 12px; margin-bottom: 18px; }
textarea { width: 100%; height: 200px; box-sizing: border-box; }
button { background-color: #ff9933; color: #ffffff; font-weight: bold; border: none; border-radius: 6px; padding: 8px 16px; cursor: pointer; }
.analysis-box { border: 2px solid #054187; border-radius: 8px; padding: 18px; margin-bottom: 18px; }
.caption { color: #6b6b6b; font-size: 0.85em; }
"#;

/// Everything one render needs: the current text and the outcome, if any.
#[derive(Debug, Clone, Default)]
pub struct PageView {
    pub speech_input: String,
    pub outcome: Option<AnalysisOutcome>,
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Two-decimal score. Values that round to zero print as "0.00", never "-0.00".
pub fn format_score(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    format!("{:.2}", rounded + 0.0)
}

pub fn entities_line(analysis: &SpeechAnalysis) -> String {
    if analysis.entities.is_empty() {
        NO_ENTITIES.to_string()
    } else {
        analysis.entity_texts().join(", ")
    }
}

/// Plain-text result lines, as shown in the panel.
pub fn summary_lines(analysis: &SpeechAnalysis) -> Vec<String> {
    vec![
        format!(
            "Sentiment Score: {} {}",
            format_score(analysis.polarity),
            analysis.sentiment.display()
        ),
        format!(
            "Subjectivity: {} ({})",
            format_score(analysis.subjectivity),
            analysis.subjectivity_label.as_str()
        ),
        format!("Named Entities: {}", entities_line(analysis)),
    ]
}

pub fn render_result(analysis: &SpeechAnalysis) -> String {
    format!(
        "<div class='analysis-box'>\
         <b>Sentiment Score:</b> <span style='color:{color}; font-weight:bold'>{score} {label}</span><br>\
         <b>Subjectivity:</b> {subj} ({subj_label})<br>\
         <b>Named Entities:</b> {entities}\
         </div>",
        color = analysis.sentiment.color(),
        score = format_score(analysis.polarity),
        label = analysis.sentiment.display(),
        subj = format_score(analysis.subjectivity),
        subj_label = analysis.subjectivity_label.as_str(),
        entities = escape_html(&entities_line(analysis)),
    )
}

pub fn render_warning(message: &str) -> String {
    format!("<div class='warning'>⚠️ {}</div>", escape_html(message))
}

fn render_sidebar() -> String {
    let mut html = String::new();
    html.push_str("<aside class='sidebar'>");
    html.push_str("<h3>About VoxPopuli</h3>");
    html.push_str(
        "<div class='info'><p>Welcome to our website where we make speeches transparent for the people, \
         in the form of subjectivity, tone, and more. This project was created with a mission to unveil \
         the true meaning behind speeches given in parliament.</p>\
         <p><b>My name is Harsh Bhati.</b></p>\
         <p>This project was initiated to solve the problem of understanding parliament or any other speech \
         by famous figures.</p></div>",
    );
    html.push_str("<h3>How to Use</h3>");
    html.push_str(
        "<div class='success'><ol>\
         <li>Paste a parliamentary or public speech in the text box.</li>\
         <li>Click 'Analyze Speech'.</li>\
         <li>View the analysis of tone, subjectivity, and named entities.</li>\
         </ol></div>",
    );
    html.push_str("<h3>Contact</h3>");
    html.push_str("<p>📧 harshbhati5252@gmail.com</p>");
    html.push_str("<p><a href='https://www.linkedin.com/in/harsh-bhati-7a5952313'>LinkedIn</a></p>");
    html.push_str("</aside>");
    html
}

pub fn render_page(view: &PageView) -> String {
    let mut body = String::new();
    body.push_str(&render_sidebar());
    body.push_str("<main class='main'>");
    body.push_str(&format!("<div class='big-title'>🇮🇳 {}</div>", PAGE_TITLE));
    body.push_str(&format!("<div class='tagline'>{}</div>", TAGLINE));
    body.push_str("<hr style='border:2px solid #054187;'>");
    body.push_str("<h2 class='section-header'>🔎 Speech Analyzer</h2>");

    body.push_str("<form method='post' action='/'>");
    body.push_str(
        "<details><summary>Need an example? Click here to fill with a sample speech!</summary>\
         <button type='submit' name='action' value='sample'>Use Sample Speech</button></details>",
    );
    body.push_str("<label for='speech_input'>Paste a parliamentary speech here:</label>");
    body.push_str(&format!(
        "<textarea id='speech_input' name='speech_input'>{}</textarea>",
        escape_html(&view.speech_input)
    ));
    body.push_str("<p><button type='submit' name='action' value='analyze'>Analyze Speech</button></p>");
    body.push_str("</form>");

    match &view.outcome {
        Some(AnalysisOutcome::Analyzed(analysis)) => body.push_str(&render_result(analysis)),
        Some(AnalysisOutcome::Warning { message }) => body.push_str(&render_warning(message)),
        None => {}
    }

    body.push_str("<hr style='border:2px solid #138808;'>");
    body.push_str("<p class='caption'>Made by Harsh Bhati • VoxPopuli 2025 🇮🇳</p>");
    body.push_str("</main>");

    format!(
        "<!DOCTYPE html><html lang='en'><head><meta charset='utf-8'>\
         <meta name='viewport' content='width=device-width, initial-scale=1'>\
         <title>{title}</title><link rel='icon' href='data:,🇮🇳'><style>{style}</style></head>\
         <body>{body}</body></html>",
        title = PAGE_TITLE,
        style = FLAG_STYLE,
        body = body,
    )
}
