//! Chat-style training samples and their JSON / JSONL files.

use holedet_core::core::{HoleError, HoleResult};
use holedet_core::domain::{LabelEntry, render_labels};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Speaker of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// One supervised example: the prompt, the expected answer and the image it
/// refers to (relative to the dataset directory).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingSample {
    pub messages: Vec<ChatMessage>,
    pub images: Vec<String>,
}

/// Wraps a JSON body in a ```` ```json ```` fence.
pub fn fence_json(body: &str) -> String {
    format!("```json\n{body}\n```")
}

impl TrainingSample {
    /// Builds a sample whose assistant turn is the fenced label list.
    pub fn new(
        prompt: &str,
        labels: &[LabelEntry],
        image_ref: impl Into<String>,
    ) -> HoleResult<Self> {
        let answer = fence_json(&render_labels(labels)?);
        Ok(Self {
            messages: vec![
                ChatMessage::new(Role::User, prompt),
                ChatMessage::new(Role::Assistant, answer),
            ],
            images: vec![image_ref.into()],
        })
    }

    /// Content of the last assistant message.
    pub fn assistant_content(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::Assistant)
            .map(|m| m.content.as_str())
    }

    pub fn image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }

    /// Compact single-line JSON form.
    pub fn to_json_line(&self) -> HoleResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Writes samples as one pretty-printed JSON array.
pub fn write_json_array(path: &Path, samples: &[TrainingSample]) -> HoleResult<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, samples)?;
    writer.flush()?;
    Ok(())
}

pub fn read_json_array(path: &Path) -> HoleResult<Vec<TrainingSample>> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

/// Writes one sample per line.
pub fn write_jsonl(path: &Path, samples: &[TrainingSample]) -> HoleResult<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for sample in samples {
        writeln!(writer, "{}", sample.to_json_line()?)?;
    }
    writer.flush()?;
    Ok(())
}

/// Reads a JSONL file, skipping blank lines.
pub fn read_jsonl(path: &Path) -> HoleResult<Vec<TrainingSample>> {
    let reader = BufReader::new(File::open(path)?);
    let mut samples = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let sample = serde_json::from_str(&line).map_err(|e| {
            HoleError::invalid_input(format!("{}:{}: {e}", path.display(), idx + 1))
        })?;
        samples.push(sample);
    }
    Ok(samples)
}

/// Converts a JSON array file next to itself as `<stem>.jsonl`, returning the
/// new path. Only the `messages` and `images` fields are carried over.
pub fn convert_json_to_jsonl(path: &Path) -> HoleResult<PathBuf> {
    let samples = read_json_array(path)?;
    let out = path.with_extension("jsonl");
    write_jsonl(&out, &samples)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use holedet_core::domain::{HoleAnnotation, HoleCategory, assemble};
    use holedet_core::processors::BBox;

    fn sample() -> HoleResult<TrainingSample> {
        let labels = assemble(&[HoleAnnotation::new(
            HoleCategory::Circle,
            BBox::new(50, 100, 150, 200),
            "18mm",
        )]);
        TrainingSample::new("<image>\n检测孔", &labels, "train_data/a.png")
    }

    #[test]
    fn test_sample_layout() -> HoleResult<()> {
        let s = sample()?;
        assert_eq!(s.messages[0].role, Role::User);
        let answer = s.assistant_content().unwrap_or_default();
        assert!(answer.starts_with("```json\n[\n"));
        assert!(answer.ends_with("]\n```"));
        assert_eq!(s.image(), Some("train_data/a.png"));
        Ok(())
    }

    #[test]
    fn test_json_line_keeps_unicode_and_field_order() -> HoleResult<()> {
        let line = sample()?.to_json_line()?;
        assert!(!line.contains('\n'));
        assert!(line.starts_with(r#"{"messages":[{"role":"user","content":"<image>\n检测孔"}"#));
        assert!(line.contains("圆孔"));
        assert!(line.ends_with(r#""images":["train_data/a.png"]}"#));
        Ok(())
    }

    #[test]
    fn test_convert_json_to_jsonl() -> HoleResult<()> {
        let dir = tempfile::tempdir()?;
        let json = dir.path().join("view.json");
        let samples = vec![sample()?, sample()?];
        write_json_array(&json, &samples)?;

        let out = convert_json_to_jsonl(&json)?;
        assert_eq!(out, dir.path().join("view.jsonl"));
        let text = std::fs::read_to_string(&out)?;
        assert_eq!(text.lines().count(), 2);
        assert_eq!(read_jsonl(&out)?, samples);
        Ok(())
    }

    #[test]
    fn test_read_jsonl_reports_line() -> HoleResult<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("bad.jsonl");
        std::fs::write(&path, format!("{}\n\nnot json\n", sample()?.to_json_line()?))?;
        match read_jsonl(&path) {
            Err(HoleError::InvalidInput { message }) => assert!(message.contains(":3:")),
            other => panic!("unexpected result: {other:?}"),
        }
        Ok(())
    }
}
