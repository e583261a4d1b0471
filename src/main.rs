use std::io::{self, Read as _};
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};

use signet::signer::{Signer, TimestampSigner, NO_MAX_AGE};
use signet::{generate_key, HashAlgorithm};

#[derive(Parser)]
#[command(name = "signet", about = "Tamper-evident signed tokens")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a new 32-byte signing key, printed as ASCII.
    Genkey,

    /// Sign a value. Reads the value from --value or stdin.
    Sign {
        /// Signing key as a 32-character ASCII string.
        #[arg(short, long)]
        key: Option<String>,

        /// Read the signing key from a file instead.
        #[arg(long, conflicts_with = "key")]
        key_file: Option<PathBuf>,

        /// Value to sign. If omitted, reads from stdin.
        #[arg(short, long)]
        value: Option<String>,

        /// Embed the current time for later expiry checks.
        #[arg(short, long, default_value_t = false)]
        timestamp: bool,

        /// Digest: "sha1", "sha256", or "sha512".
        #[arg(short, long, default_value = "sha1")]
        digest: String,
    },

    /// Verify a signed token and print the recovered value.
    Unsign {
        /// Verification keys, oldest first (repeatable; last is primary).
        #[arg(short, long)]
        key: Vec<String>,

        /// Verification key files, appended after --key entries.
        #[arg(long)]
        key_file: Vec<PathBuf>,

        /// Signed token. If omitted, reads from stdin.
        #[arg(short, long)]
        token: Option<String>,

        /// Maximum token age in seconds for timestamped tokens;
        /// 0 means no limit.
        #[arg(short, long)]
        max_age: Option<u64>,

        /// Digest: "sha1", "sha256", or "sha512".
        #[arg(short, long, default_value = "sha1")]
        digest: String,
    },

    /// Check a signed token, print "true" or "false", and exit
    /// non-zero when invalid.
    Validate {
        /// Verification keys, oldest first (repeatable; last is primary).
        #[arg(short, long)]
        key: Vec<String>,

        /// Verification key files, appended after --key entries.
        #[arg(long)]
        key_file: Vec<PathBuf>,

        /// Signed token. If omitted, reads from stdin.
        #[arg(short, long)]
        token: Option<String>,

        /// Maximum token age in seconds for timestamped tokens;
        /// 0 means no limit.
        #[arg(short, long)]
        max_age: Option<u64>,

        /// Digest: "sha1", "sha256", or "sha512".
        #[arg(short, long, default_value = "sha1")]
        digest: String,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Genkey => cmd_genkey(),
        Command::Sign {
            key,
            key_file,
            value,
            timestamp,
            digest,
        } => cmd_sign(key, key_file, value, timestamp, &digest),
        Command::Unsign {
            key,
            key_file,
            token,
            max_age,
            digest,
        } => cmd_unsign(&key, &key_file, token, max_age, &digest),
        Command::Validate {
            key,
            key_file,
            token,
            max_age,
            digest,
        } => cmd_validate(&key, &key_file, token, max_age, &digest),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

type CliResult = Result<(), Box<dyn std::error::Error>>;

fn cmd_genkey() -> CliResult {
    let key = generate_key();
    println!("{}", String::from_utf8_lossy(&key));
    Ok(())
}

fn cmd_sign(
    key: Option<String>,
    key_file: Option<PathBuf>,
    value: Option<String>,
    timestamp: bool,
    digest: &str,
) -> CliResult {
    let inline: Vec<String> = key.into_iter().collect();
    let files: Vec<PathBuf> = key_file.into_iter().collect();
    let signer = build_signer(load_keys(&inline, &files)?, digest)?;
    let value = read_value(value)?;

    let signed = if timestamp {
        TimestampSigner::new(signer).sign(&value)
    } else {
        signer.sign(&value)
    };
    println!("{}", String::from_utf8_lossy(&signed));
    Ok(())
}

fn cmd_unsign(
    keys: &[String],
    key_files: &[PathBuf],
    token: Option<String>,
    max_age: Option<u64>,
    digest: &str,
) -> CliResult {
    let signer = build_signer(load_keys(keys, key_files)?, digest)?;
    let token = read_value(token)?;

    match max_age {
        // --max-age given: treat the token as timestamped.
        Some(secs) => {
            let (value, issued_at) =
                TimestampSigner::new(signer).unsign(&token, max_age_duration(secs))?;
            println!("{}", String::from_utf8_lossy(&value));
            eprintln!("issued at {issued_at}");
        }
        None => {
            let value = signer.unsign(&token)?;
            println!("{}", String::from_utf8_lossy(&value));
        }
    }
    Ok(())
}

fn cmd_validate(
    keys: &[String],
    key_files: &[PathBuf],
    token: Option<String>,
    max_age: Option<u64>,
    digest: &str,
) -> CliResult {
    let signer = build_signer(load_keys(keys, key_files)?, digest)?;
    let token = read_value(token)?;

    let valid = match max_age {
        Some(secs) => TimestampSigner::new(signer).validate(&token, max_age_duration(secs)),
        None => signer.validate(&token),
    };
    println!("{valid}");
    if !valid {
        std::process::exit(1);
    }
    Ok(())
}

fn max_age_duration(secs: u64) -> Duration {
    if secs == 0 {
        NO_MAX_AGE
    } else {
        Duration::from_secs(secs)
    }
}

/// Collect keys from --key strings and --key-file paths, files appended
/// after the inline keys. Trailing newlines in key files are stripped.
fn load_keys(
    keys: &[String],
    key_files: &[PathBuf],
) -> Result<Vec<Vec<u8>>, Box<dyn std::error::Error>> {
    let mut out: Vec<Vec<u8>> = keys.iter().map(|k| k.clone().into_bytes()).collect();
    for path in key_files {
        out.push(trim_newlines(std::fs::read(path)?));
    }
    Ok(out)
}

fn build_signer(keys: Vec<Vec<u8>>, digest: &str) -> Result<Signer, Box<dyn std::error::Error>> {
    let digest = match digest {
        "sha1" => HashAlgorithm::Sha1,
        "sha256" => HashAlgorithm::Sha256,
        "sha512" => HashAlgorithm::Sha512,
        other => return Err(format!("unknown digest: {other}").into()),
    };
    Ok(Signer::builder().keys(keys).digest(digest).build()?)
}

/// Read the value from the argument, or stdin if absent. Trailing
/// newlines are stripped so piped tokens verify cleanly.
fn read_value(arg: Option<String>) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let bytes = match arg {
        Some(v) => v.into_bytes(),
        None => {
            let mut buf = Vec::new();
            io::stdin().read_to_end(&mut buf)?;
            buf
        }
    };
    Ok(trim_newlines(bytes))
}

fn trim_newlines(mut bytes: Vec<u8>) -> Vec<u8> {
    while bytes.last() == Some(&b'\n') || bytes.last() == Some(&b'\r') {
        bytes.pop();
    }
    bytes
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn write_key_file(name: &str, contents: &[u8]) -> PathBuf {
        let path = std::env::temp_dir().join(format!("signet-test-{name}-{}", std::process::id()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_validate_subcommand_parses() {
        let cli = Cli::try_parse_from([
            "signet", "validate", "--key", "k", "--token", "t", "--max-age", "60",
        ])
        .unwrap();
        match cli.command {
            Command::Validate { key, token, max_age, .. } => {
                assert_eq!(key, vec!["k".to_string()]);
                assert_eq!(token.as_deref(), Some("t"));
                assert_eq!(max_age, Some(60));
            }
            _ => panic!("expected Validate"),
        }
    }

    #[test]
    fn test_sign_key_and_key_file_conflict() {
        let result = Cli::try_parse_from([
            "signet", "sign", "--key", "k", "--key-file", "/tmp/k", "--value", "v",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_load_keys_appends_files_after_inline_keys() {
        let path = write_key_file("append", b"bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb\n");
        let keys = load_keys(&["a".repeat(32)], std::slice::from_ref(&path)).unwrap();
        std::fs::remove_file(&path).unwrap();

        // Last entry is primary, so the file key wins new signatures.
        assert_eq!(keys.len(), 2);
        assert_eq!(keys[0], "a".repeat(32).into_bytes());
        assert_eq!(keys[1], b"bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb".to_vec());
    }

    #[test]
    fn test_load_keys_strips_key_file_newline() {
        let path = write_key_file("newline", b"cccccccccccccccccccccccccccccccc\r\n");
        let keys = load_keys(&[], std::slice::from_ref(&path)).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(keys, vec![b"cccccccccccccccccccccccccccccccc".to_vec()]);
        assert!(build_signer(keys, "sha1").is_ok());
    }

    #[test]
    fn test_build_signer_rejects_unknown_digest() {
        assert!(build_signer(vec![vec![0x41; 32]], "md5").is_err());
    }

    #[test]
    fn test_trim_newlines() {
        assert_eq!(trim_newlines(b"token\n".to_vec()), b"token".to_vec());
        assert_eq!(trim_newlines(b"token\r\n\r\n".to_vec()), b"token".to_vec());
        assert_eq!(trim_newlines(b"token".to_vec()), b"token".to_vec());
    }
}
