//! Command execution.

use crate::Commands;
use colored::Colorize;
use rap_client::{Client, ClientError};
use rap_core::RegisterTarget;
use rap_protocol::{Address, Codec, Data, Profile};

/// Executes a command and returns the formatted output.
pub fn execute(client: &Client, cmd: Commands) -> Result<String, ClientError> {
    let profile = *client.profile();
    match cmd {
        Commands::Read { address } => {
            let value = client.read(address)?;
            Ok(format_words(&profile, &[(address, value)]))
        }

        Commands::Write { address, data } => {
            client.write(address, data)?;
            Ok(format!(
                "{} {} to {}",
                "Wrote".green(),
                format_data(&profile, data),
                format_address(&profile, address).cyan()
            ))
        }

        Commands::Rmw {
            address,
            data,
            mask,
        } => {
            client.read_modify_write(address, data, mask)?;
            Ok(format!(
                "{} {} under mask {} at {}",
                "Merged".green(),
                format_data(&profile, data),
                format_data(&profile, mask),
                format_address(&profile, address).cyan()
            ))
        }

        Commands::SeqRead {
            address,
            count,
            increment,
        } => {
            let increment = increment.unwrap_or_else(|| default_increment(&profile));
            let mut out = vec![0; count];
            client.seq_read(address, &mut out, increment)?;
            let rows: Vec<_> = out
                .iter()
                .enumerate()
                .map(|(i, value)| (stride(address, i, increment), *value))
                .collect();
            Ok(format_words(&profile, &rows))
        }

        Commands::SeqWrite {
            address,
            data,
            increment,
        } => {
            let increment = increment.unwrap_or_else(|| default_increment(&profile));
            client.seq_write(address, &data, increment)?;
            Ok(format!(
                "{} {} words from {} (increment {})",
                "Wrote".green(),
                data.len(),
                format_address(&profile, address).cyan(),
                increment
            ))
        }

        Commands::FifoRead { address, count } => {
            let mut out = vec![0; count];
            client.fifo_read(address, &mut out)?;
            let rows: Vec<_> = out.iter().map(|value| (address, *value)).collect();
            Ok(format_words(&profile, &rows))
        }

        Commands::FifoWrite { address, data } => {
            client.fifo_write(address, &data)?;
            Ok(format!(
                "{} {} words to {}",
                "Wrote".green(),
                data.len(),
                format_address(&profile, address).cyan()
            ))
        }

        Commands::CompRead { addresses } => {
            let mut out = vec![0; addresses.len()];
            client.comp_read(&addresses, &mut out)?;
            let rows: Vec<_> = addresses.iter().copied().zip(out).collect();
            Ok(format_words(&profile, &rows))
        }

        Commands::CompWrite { pairs } => {
            client.comp_write(&pairs)?;
            Ok(format!("{} {} registers", "Wrote".green(), pairs.len()))
        }

        Commands::Limits => Ok(format_limits(client.codec())),
    }
}

/// Parses a decimal or `0x`-prefixed hexadecimal integer. `_` separators are
/// ignored.
pub fn parse_u64(s: &str) -> Result<u64, String> {
    let cleaned = s.replace('_', "");
    let parsed = match cleaned
        .strip_prefix("0x")
        .or_else(|| cleaned.strip_prefix("0X"))
    {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => cleaned.parse(),
    };
    parsed.map_err(|e| format!("invalid number '{}': {}", s, e))
}

/// Parses an `ADDRESS=DATA` pair.
pub fn parse_pair(s: &str) -> Result<(Address, Data), String> {
    let (address, data) = s
        .split_once('=')
        .ok_or_else(|| format!("expected ADDRESS=DATA, got '{}'", s))?;
    Ok((parse_u64(address.trim())?, parse_u64(data.trim())?))
}

fn default_increment(profile: &Profile) -> u64 {
    profile.data.storage.bytes() as u64
}

fn stride(start: Address, index: usize, increment: u64) -> Address {
    start.wrapping_add(increment.wrapping_mul(index as u64))
}

fn format_address(profile: &Profile, address: Address) -> String {
    format!("{:#0width$x}", address, width = 2 + 2 * profile.address_bytes())
}

fn format_data(profile: &Profile, data: Data) -> String {
    format!("{:#0width$x}", data, width = 2 + 2 * profile.data_bytes())
}

fn format_words(profile: &Profile, rows: &[(Address, Data)]) -> String {
    rows.iter()
        .map(|(address, value)| {
            format!(
                "{}: {}",
                format_address(profile, *address).cyan(),
                format_data(profile, *value)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_limits(codec: &Codec) -> String {
    [
        ("max message size", codec.max_message_size() as u64),
        ("seq read", codec.max_seq_read_count()),
        ("seq write", codec.max_seq_write_count()),
        ("comp read", codec.max_comp_read_count()),
        ("comp write", codec.max_comp_write_count()),
    ]
    .iter()
    .map(|(name, value)| format!("{:<18}{}", format!("{}:", name).bold(), value))
    .collect::<Vec<_>>()
    .join("\n")
}
