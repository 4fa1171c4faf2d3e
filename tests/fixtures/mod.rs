//! Canned payloads and response bodies for upload tests

/// Body the digitization service returns for an accepted capture.
pub const SUCCESS_BODY: &str = r#"{
    "status": "success",
    "jobId": "4f1c2a9e-job",
    "message": "ECG digitized successfully",
    "outputFiles": ["lead_I.csv", "lead_II.csv", "overlay.png"],
    "stdout": "Loaded model M3\nDetected 12 leads\n"
}"#;

/// Accepted capture without the optional stdout log.
pub const SUCCESS_BODY_NO_STDOUT: &str =
    r#"{"status": "success", "jobId": "job-2", "message": "ok", "outputFiles": []}"#;

pub const UNPROCESSABLE_BODY: &str = r#"{"error": "bad image", "stderr": null}"#;

pub const SERVER_ERROR_BODY: &str =
    r#"{"error": "digitizer crashed", "stderr": "Traceback (most recent call last): ..."}"#;

pub const NOT_JSON_BODY: &str = "<html><body>502 Bad Gateway</body></html>";

/// JPEG-framed payload containing byte sequences that resemble multipart syntax.
pub fn sample_jpeg() -> Vec<u8> {
    let mut bytes = vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];
    bytes.extend_from_slice(b"JFIF\0");
    for i in 0..16_384u32 {
        bytes.push((i.wrapping_mul(31) % 251) as u8);
        if i % 1024 == 0 {
            bytes.extend_from_slice(b"\r\n--not-the-boundary\r\n\r\n");
        }
    }
    bytes.extend_from_slice(&[0xFF, 0xD9]);
    bytes
}
