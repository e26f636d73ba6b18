//! Server-rendered HTML for the upload / predict flow.

use base64::engine::general_purpose;
use base64::Engine as _;
use uuid::Uuid;

const TITLE: &str = "Speech Emotion Recognition";
const DESCRIPTION: &str = "Upload a short speech clip and the classifier will guess the emotion \
in the speaker's voice from its MFCC, chroma and mel-spectrogram features.";

/// Escape text for use in HTML bodies and attribute values
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

fn layout(body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{title}</title>\n</head>\n<body>\n<h1>{title}</h1>\n{body}\n</body>\n</html>\n",
        title = TITLE,
        body = body
    )
}

fn upload_form() -> String {
    "<form action=\"/upload\" method=\"post\" enctype=\"multipart/form-data\">\n\
     <input type=\"file\" name=\"file\" accept=\".wav\" required>\n\
     <button type=\"submit\">Upload</button>\n</form>"
        .to_string()
}

pub fn index_page() -> String {
    layout(&format!("<p>{}</p>\n{}", DESCRIPTION, upload_form()))
}

/// Shown after a successful upload: player plus the predict trigger
pub fn uploaded_page(id: Uuid, original_name: Option<&str>, duration_secs: f32) -> String {
    let name = escape(original_name.unwrap_or("clip"));
    layout(&format!(
        "<p class=\"status\">File uploaded</p>\n\
         <p>{name} ({duration:.2} s)</p>\n\
         <audio controls src=\"/clips/{id}/audio\"></audio>\n\
         <form action=\"/clips/{id}/predict\" method=\"post\">\n\
         <button type=\"submit\">Predict Emotion</button>\n</form>",
        name = name,
        duration = duration_secs,
        id = id
    ))
}

/// Inline `data:` URI for a WAV clip, so the player outlives the clip's file
pub fn wav_data_uri(wav: &[u8]) -> String {
    format!("data:audio/wav;base64,{}", general_purpose::STANDARD.encode(wav))
}

/// Prediction result: player, waveform plot and the emotion header
pub fn result_page(header: &str, waveform_svg: &str, wav: &[u8]) -> String {
    layout(&format!(
        "<audio controls src=\"{audio}\"></audio>\n\
         <div class=\"waveform\">{svg}</div>\n<h2>{header}</h2>\n{form}",
        audio = wav_data_uri(wav),
        svg = waveform_svg,
        header = escape(header),
        form = upload_form()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape() {
        assert_eq!(
            escape("<a href=\"x\">Tom & 'Jerry'</a>"),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_index_has_form() {
        let page = index_page();
        assert!(page.contains("<title>Speech Emotion Recognition</title>"));
        assert!(page.contains("accept=\".wav\""));
        assert!(page.contains("action=\"/upload\""));
    }

    #[test]
    fn test_uploaded_page_links_clip() {
        let id = Uuid::nil();
        let page = uploaded_page(id, Some("<evil>.wav"), 1.5);
        assert!(page.contains("File uploaded"));
        assert!(page.contains(&format!("/clips/{}/audio", id)));
        assert!(page.contains(&format!("/clips/{}/predict", id)));
        assert!(page.contains("Predict Emotion"));
        assert!(page.contains("&lt;evil&gt;.wav"));
        assert!(page.contains("1.50 s"));
    }

    #[test]
    fn test_result_page_shows_header() {
        let page = result_page("Emotion of the audio is CALM", "<svg></svg>", b"RIFF");
        assert!(page.contains("<h2>Emotion of the audio is CALM</h2>"));
        assert!(page.contains("<svg></svg>"));
    }

    #[test]
    fn test_result_page_keeps_player() {
        let page = result_page("Emotion of the audio is CALM", "<svg></svg>", b"RIFF");
        assert!(page.contains("<audio controls src=\"data:audio/wav;base64,UklGRg==\"></audio>"));
    }
}
