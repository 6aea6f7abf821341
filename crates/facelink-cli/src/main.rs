use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use facelink_core::{EnrollmentImage, RecognitionOutcome};
use facelink_gateway::HttpGateway;
use facelink_hw::{MediaDeviceSession, StreamConstraints, V4lDevice, VideoStream};
use facelink_session::{PersonRegistryController, WebcamRecognitionController};
use std::io::Write;
use std::path::{Path, PathBuf};

mod config;
use config::Config;

#[derive(Parser)]
#[command(name = "facelink", about = "Face recognition client for the facelink service")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List persons enrolled on the server
    List,
    /// Enroll a person from 2-4 reference image files
    Enroll {
        /// Person name (unique on the server)
        name: String,
        /// Reference image files (jpeg or png)
        #[arg(num_args = 2..=4, required = true)]
        images: Vec<PathBuf>,
    },
    /// Delete an enrolled person
    Remove {
        name: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Capture one webcam frame and ask the server who it is
    Recognize,
    /// Save one webcam frame to disk
    Snapshot {
        output: PathBuf,
        /// Apply the selfie-view horizontal flip (preview only; never
        /// used for recognition uploads)
        #[arg(long)]
        mirror: bool,
    },
    /// List available capture devices
    Devices,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();

    match cli.command {
        Commands::List => {
            let registry = registry(&config)?;
            registry.refresh().await?;
            let persons = registry.persons();
            if persons.is_empty() {
                println!("No persons registered yet.");
            } else {
                for person in persons {
                    println!("{} ({} images)", person.name, person.enrollment_image_count);
                }
            }
        }
        Commands::Enroll { name, images } => {
            let images = images
                .iter()
                .map(|path| load_image(path))
                .collect::<Result<Vec<_>>>()?;
            let registry = registry(&config)?;
            let message = registry.submit_enrollment(&name, images).await?;
            println!("{message}");
        }
        Commands::Remove { name, yes } => {
            if !yes && !confirm(&format!("Delete '{name}'?"))? {
                println!("Aborted.");
                return Ok(());
            }
            let registry = registry(&config)?;
            registry.remove_person(&name).await?;
            println!("Deleted '{name}'.");
        }
        Commands::Recognize => {
            let gateway = HttpGateway::new(&config.api_url)?;
            let device = V4lDevice::new(&config.camera_device, config.warmup_frames);
            let webcam =
                WebcamRecognitionController::new(device, gateway, StreamConstraints::default());

            webcam.start()?;
            let result = webcam.capture().await;
            webcam.stop();

            match result? {
                Some(outcome) => print_outcome(&outcome),
                None => println!("Capture was not performed."),
            }
        }
        Commands::Snapshot { output, mirror } => {
            let device = V4lDevice::new(&config.camera_device, config.warmup_frames);
            let mut session = MediaDeviceSession::new(device);
            session.acquire(&StreamConstraints::default())?;

            let frame = session
                .stream_mut()
                .context("no active stream")?
                .read_frame()?;
            session.release();

            let frame = if mirror { frame.mirrored() } else { frame };
            image::save_buffer(
                &output,
                &frame.data,
                frame.width,
                frame.height,
                image::ExtendedColorType::Rgb8,
            )
            .with_context(|| format!("failed to write {}", output.display()))?;
            println!(
                "Saved {}x{} frame to {}",
                frame.width,
                frame.height,
                output.display()
            );
        }
        Commands::Devices => {
            let devices = V4lDevice::list_devices();
            if devices.is_empty() {
                println!("No capture devices found.");
            } else {
                for info in devices {
                    println!("{}  {} ({})", info.path, info.name, info.driver);
                }
            }
        }
    }

    Ok(())
}

fn registry(config: &Config) -> Result<PersonRegistryController<HttpGateway>> {
    Ok(PersonRegistryController::new(HttpGateway::new(
        &config.api_url,
    )?))
}

/// Read a reference image from disk, deriving the multipart file name
/// and content type from the path.
fn load_image(path: &Path) -> Result<EnrollmentImage> {
    let content_type = match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        other => bail!(
            "unsupported image type {:?} for {} (expected jpg, jpeg, or png)",
            other.unwrap_or(""),
            path.display()
        ),
    };

    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("image")
        .to_string();

    Ok(EnrollmentImage {
        file_name,
        content_type: content_type.to_string(),
        bytes,
    })
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt} [y/N] ");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(matches!(line.trim(), "y" | "Y" | "yes"))
}

fn print_outcome(outcome: &RecognitionOutcome) {
    match &outcome.matched_name {
        Some(name) => {
            match outcome.confidence_percent {
                Some(confidence) => println!("Recognized: {name} (confidence {confidence:.1}%)"),
                None => println!("Recognized: {name}"),
            }
        }
        None => println!("Face not recognized."),
    }
    if !outcome.message.is_empty() {
        println!("{}", outcome.message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_image_rejects_unknown_extension() {
        assert!(load_image(Path::new("face.gif")).is_err());
        assert!(load_image(Path::new("face")).is_err());
    }

    #[test]
    fn test_load_image_content_type() {
        // Nonexistent file: extension check runs before I/O, so a read
        // error here proves the type was accepted.
        let err = load_image(Path::new("/nonexistent/face.JPG")).unwrap_err();
        assert!(err.to_string().contains("failed to read"));
        let err = load_image(Path::new("/nonexistent/face.png")).unwrap_err();
        assert!(err.to_string().contains("failed to read"));
    }
}
