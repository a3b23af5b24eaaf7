//! CLI handler for token generation and inspection.

use anyhow::{anyhow, Result};
use chrono::{TimeZone, Utc};

use super::args::{TokenCliArgs, TokenCommand};
use crate::config::Config;
use crate::token::{self, Privilege, Role, TokenContents};

pub fn handle_token_command(args: TokenCliArgs, config: &Config) -> Result<()> {
    match args.command {
        TokenCommand::Generate {
            channel,
            uid,
            role,
            validity,
        } => {
            let role = Role::from_request(role.as_deref());
            let validity = validity.unwrap_or(config.transport.token_validity_seconds);
            let token = token::generate_token(
                &config.transport.app_id,
                &config.transport.app_certificate,
                &channel,
                &uid,
                role,
                validity,
            )?;
            println!("{}", token);
            Ok(())
        }
        TokenCommand::Inspect {
            token,
            verify,
            channel,
            uid,
        } => {
            let contents = TokenContents::parse(&token, &config.transport.app_id)
                .map_err(|e| anyhow!("Failed to decode token: {}", e))?;
            print_contents(&contents);

            if verify {
                let (Some(channel), Some(uid)) = (channel, uid) else {
                    return Err(anyhow!("--verify needs --channel and --uid"));
                };
                if contents.verify(&config.transport.app_certificate, &channel, &uid) {
                    println!("Signature: valid for channel {} uid {}", channel, uid);
                } else {
                    return Err(anyhow!(
                        "Signature does not match channel {} uid {} with the configured certificate",
                        channel,
                        uid
                    ));
                }
            }
            Ok(())
        }
    }
}

fn print_contents(contents: &TokenContents) {
    println!("App ID:     {}", contents.app_id);
    println!("Salt:       {}", contents.salt);
    println!("Expires:    {}", format_timestamp(contents.expires_at));
    println!("CRC channel {:08x}", contents.crc_channel_name);
    println!("CRC uid     {:08x}", contents.crc_uid);
    println!("Privileges:");
    for (code, expires_at) in &contents.privileges {
        let name = Privilege::from_code(*code)
            .map(|p| p.as_str())
            .unwrap_or("unknown");
        println!("  {:>2} {:<14} {}", code, name, format_timestamp(*expires_at));
    }
}

fn format_timestamp(secs: u32) -> String {
    match Utc.timestamp_opt(i64::from(secs), 0).single() {
        Some(time) => format!("{} ({})", time.to_rfc3339(), secs),
        None => secs.to_string(),
    }
}
