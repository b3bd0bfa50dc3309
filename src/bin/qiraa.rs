use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Parser, Subcommand};
use qiraa_rs::audio::{decode_audio, decode_base64, encode_wav, export_file_name, SAMPLE_RATE};
use qiraa_rs::credentials::{ChainedCredentialStore, EnvCredentialStore, FileCredentialStore};
use qiraa_rs::service::gemini::{GeminiClient, GeminiSettings};
use qiraa_rs::session::Applied;
use qiraa_rs::text::{strip_tashkeel, DIACRITICS, PRESET_LESSONS};
use qiraa_rs::{ArabicVoice, Config, Session};

#[derive(Debug, Parser)]
#[command(name = "qiraa")]
#[command(about = "Natural Arabic narration from the command line")]
struct Cli {
    /// Path to the TOML config file
    #[arg(long, global = true, default_value = "qiraa.toml")]
    config: PathBuf,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Narrate text, play it and save it as WAV
    Speak {
        text: String,
        #[arg(long)]
        voice: Option<ArabicVoice>,
        /// Add tashkeel automatically before narrating
        #[arg(long)]
        tashkeel: bool,
        /// Directory for the exported WAV (defaults to `output_dir` from config)
        #[arg(long)]
        out: Option<PathBuf>,
        #[arg(long)]
        no_play: bool,
    },
    /// Add tashkeel to text and print it
    Tashkeel { text: String },
    /// Remove tashkeel from text and print it
    Strip { text: String },
    /// Convert a file of base64 PCM (or `-` for stdin) into a WAV file
    Decode {
        input: PathBuf,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// List the built-in practice texts
    Lessons,
    /// List available voices and diacritic marks
    Voices,
    /// Manage the stored API key
    Key {
        #[command(subcommand)]
        action: KeyAction,
    },
}

#[derive(Debug, Subcommand)]
enum KeyAction {
    Set { key: String },
    Show,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;
    let credentials = ChainedCredentialStore::new(vec![
        Box::new(FileCredentialStore::new(&config.credential_file)),
        Box::new(EnvCredentialStore),
    ]);
    let mut session = Session::new(Box::new(credentials))?;
    session.set_voice(config.voice);

    match cli.command {
        Commands::Speak {
            text,
            voice,
            tashkeel,
            out,
            no_play,
        } => {
            if let Some(voice) = voice {
                session.set_voice(voice);
            }
            session.set_text(text);
            let client = GeminiClient::new(GeminiSettings::from_config(&config, session.api_key()))?;

            if tashkeel {
                if session.fix_text(&client) == Some(Applied::Text) {
                    println!("{}", session.text());
                }
                fail_on_banner(&session);
            }

            let synth_start = Instant::now();
            let id = match session.generate(&client) {
                Some(Applied::Snippet(id)) => id,
                _ => {
                    fail_on_banner(&session);
                    eprintln!("Nothing to narrate.");
                    std::process::exit(1);
                }
            };
            if let Some(snippet) = session.history().get(id) {
                println!(
                    "[{}] Narrated in {:.2?} with {}",
                    snippet.time_label(),
                    synth_start.elapsed(),
                    snippet.voice
                );
            }

            let dir = out.unwrap_or_else(|| config.output_dir.clone());
            std::fs::create_dir_all(&dir)?;
            match session.export_snippet(id, &dir) {
                Ok(path) => println!("Saved to {}", path.display()),
                Err(_) => fail_on_banner(&session),
            }

            if !no_play {
                play(&mut session, id);
            }
        }
        Commands::Tashkeel { text } => {
            session.set_text(text);
            let client = GeminiClient::new(GeminiSettings::from_config(&config, session.api_key()))?;
            session.fix_text(&client);
            fail_on_banner(&session);
            println!("{}", session.text());
        }
        Commands::Strip { text } => println!("{}", strip_tashkeel(&text)),
        Commands::Decode { input, out } => decode_file(&input, out)?,
        Commands::Lessons => {
            for lesson in PRESET_LESSONS {
                println!("[{:?}] {}\n  {}", lesson.category, lesson.title, lesson.content);
            }
        }
        Commands::Voices => {
            for voice in ArabicVoice::ALL {
                let marker = if voice == session.voice() { "*" } else { " " };
                println!("{marker} {voice}");
            }
            println!();
            for d in DIACRITICS {
                println!("  {} \u{25CC}{}", d.label, d.mark);
            }
        }
        Commands::Key { action } => match action {
            KeyAction::Set { key } => {
                session.set_api_key(key)?;
                println!("API key saved to {}", config.credential_file.display());
            }
            KeyAction::Show => {
                let key = session.api_key();
                if key.is_empty() {
                    println!("No API key stored");
                } else {
                    let skip = key.chars().count().saturating_sub(4);
                    let tail: String = key.chars().skip(skip).collect();
                    println!("API key ending in ...{tail}");
                }
            }
        },
    }

    Ok(())
}

fn fail_on_banner(session: &Session) {
    if let Some(message) = session.error() {
        eprintln!("{message}");
        std::process::exit(1);
    }
}

#[cfg(feature = "playback")]
fn play(session: &mut Session, id: uuid::Uuid) {
    let mut output = qiraa_rs::audio::AudioOutput::new();
    match session.play_snippet(id, &mut output) {
        Ok(playback) => playback.wait(),
        Err(_) => fail_on_banner(session),
    }
}

#[cfg(not(feature = "playback"))]
fn play(_session: &mut Session, _id: uuid::Uuid) {
    log::warn!("Built without the `playback` feature; skipping playback");
}

fn decode_file(input: &Path, out: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let mut payload = String::new();
    if input == Path::new("-") {
        std::io::stdin().read_to_string(&mut payload)?;
    } else {
        payload = std::fs::read_to_string(input)?;
    }

    let bytes = decode_base64(payload.trim())?;
    let buffer = decode_audio(&bytes, SAMPLE_RATE)?;
    let path = out.unwrap_or_else(|| {
        PathBuf::from(export_file_name(chrono::Utc::now().timestamp_millis()))
    });
    encode_wav(&bytes).write_to(&path)?;
    println!(
        "Wrote {:.2}s of audio to {}",
        buffer.duration_secs(),
        path.display()
    );
    Ok(())
}
