/// CLI configuration, loaded from environment variables.
pub struct Config {
    /// Base URL of the recognition service.
    pub api_url: String,
    /// V4L2 device path for webcam commands.
    pub camera_device: String,
    /// Frames discarded after acquisition (auto-exposure settling).
    pub warmup_frames: usize,
}

impl Config {
    /// Load configuration from `FACELINK_*` environment variables with defaults.
    pub fn from_env() -> Self {
        Self {
            api_url: std::env::var("FACELINK_API_URL")
                .unwrap_or_else(|_| "http://localhost:8000".to_string()),
            camera_device: std::env::var("FACELINK_CAMERA_DEVICE")
                .unwrap_or_else(|_| "/dev/video0".to_string()),
            warmup_frames: env_usize("FACELINK_WARMUP_FRAMES", 2),
        }
    }
}

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
