use tokio::fs;

/// Best-effort text extraction via `pdftotext`. Any failure (missing binary,
/// corrupt file, empty output) degrades to a lossy UTF-8 decode of the bytes.
pub async fn extract_pdf_text(data: &[u8]) -> String {
    match run_pdftotext(data).await {
        Ok(text) if !text.trim().is_empty() => text,
        Ok(_) => {
            tracing::warn!("pdftotext produced no text, falling back to raw decode");
            lossy_decode(data)
        }
        Err(e) => {
            tracing::warn!("pdftotext failed, falling back to raw decode: {}", e);
            lossy_decode(data)
        }
    }
}

pub fn lossy_decode(data: &[u8]) -> String {
    String::from_utf8_lossy(data).replace('\u{FFFD}', "")
}

async fn run_pdftotext(data: &[u8]) -> anyhow::Result<String> {
    let path = std::env::temp_dir().join(format!("upload_{}.pdf", uuid::Uuid::new_v4()));
    fs::write(&path, data).await?;

    let output = tokio::process::Command::new("pdftotext")
        .arg("-enc")
        .arg("UTF-8")
        .arg(&path)
        .arg("-")
        .output()
        .await;

    let _ = fs::remove_file(&path).await;

    let out = output?;
    if !out.status.success() {
        anyhow::bail!(
            "pdftotext exited with {}: {}",
            out.status,
            String::from_utf8_lossy(&out.stderr)
        );
    }
    Ok(String::from_utf8_lossy(&out.stdout).to_string())
}
