// OSIntranet - command line
//
// Every command opens the database named by --db or OSINTRANET_DB and runs
// one service query or command against it.

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;

use osintranet::config::{Config, DB_VAR, LOG_FORMAT_VAR};
use osintranet::service::adresse::{AdresselisteGet, TelefonlisteGet};
use osintranet::service::finansstyring::{
    BogforingslinjerGet, BudgetkontoplanGet, DebitorlisteGet, KontoplanGet, KontoplanImport,
    KreditorlisteGet, RegnskabslisteGet,
};
use osintranet::{
    import_posteringer, load_csv, logging, AdresseService, AuditRepository, CommandHandler,
    FinansstyringService, LogFormat, QueryHandler, SqliteRepository,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "OSIntranet bookkeeping, address book and calendar")]
struct Args {
    /// SQLite database file
    #[arg(long, global = true, env = DB_VAR)]
    db: Option<PathBuf>,

    #[arg(long, global = true, env = LOG_FORMAT_VAR)]
    log_format: Option<LogFormat>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the database schema
    Init,
    /// Create or replace a chart of accounts from a JSON file
    Kontoplan {
        file: PathBuf,
    },
    /// Import posting lines from CSV; known lines are skipped
    Import {
        csv: PathBuf,
        #[arg(long)]
        regnskab: i32,
    },
    /// List regnskaber
    Regnskaber,
    /// Account balances at a date
    Konti {
        #[arg(long)]
        regnskab: i32,
        #[arg(long)]
        dato: Option<NaiveDate>,
    },
    /// Budget account status for the month of a date
    Budgetkonti {
        #[arg(long)]
        regnskab: i32,
        #[arg(long)]
        dato: Option<NaiveDate>,
    },
    /// Latest posting lines up to a date
    Bogforingslinjer {
        #[arg(long)]
        regnskab: i32,
        #[arg(long)]
        dato: Option<NaiveDate>,
        #[arg(long, default_value_t = 25)]
        antal: usize,
    },
    Debitorer {
        #[arg(long)]
        regnskab: i32,
        #[arg(long)]
        dato: Option<NaiveDate>,
    },
    Kreditorer {
        #[arg(long)]
        regnskab: i32,
        #[arg(long)]
        dato: Option<NaiveDate>,
    },
    Adresseliste,
    Telefonliste,
    /// Audit trail of one entity
    Events {
        entity_type: String,
        entity_id: String,
    },
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::load();

    logging::init(args.log_format.unwrap_or(config.log_format))?;

    let db_path = args.db.clone().unwrap_or_else(|| config.db_path.clone());
    let repo = SqliteRepository::open(&db_path)
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;

    run(&repo, args.command, args.json)
}

fn run(repo: &SqliteRepository, command: Command, json: bool) -> Result<()> {
    let finans = FinansstyringService::new(repo);
    let adresser = AdresseService::new(repo);

    match command {
        Command::Init => {
            println!("✓ Database ready");
        }

        Command::Kontoplan { file } => {
            let data = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let import: KontoplanImport = serde_json::from_str(&data)
                .with_context(|| format!("Failed to parse {}", file.display()))?;
            let regnskab = finans.execute(import)?;
            println!("✓ Kontoplan for regnskab {} {} imported", regnskab.nummer, regnskab.navn);
        }

        Command::Import { csv, regnskab } => {
            let lines = load_csv(&csv)?;
            let source = csv
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("unknown.csv");
            let report = import_posteringer(repo, regnskab, source, lines)?;
            if json {
                print_json(&report)?;
            } else {
                println!("✓ Read: {} lines", report.lines_read);
                println!("✓ Inserted: {} lines", report.inserted);
                println!("✓ Skipped duplicates: {}", report.duplicates);
                if report.advarsler > 0 {
                    println!("⚠ Warnings: {}", report.advarsler);
                }
            }
        }

        Command::Regnskaber => {
            let regnskaber = finans.query(RegnskabslisteGet)?;
            if json {
                print_json(&regnskaber)?;
            } else {
                for r in regnskaber {
                    println!("{:>4}  {}", r.nummer, r.navn);
                }
            }
        }

        Command::Konti { regnskab, dato } => {
            let konti = finans.query(KontoplanGet { regnskab, dato: dato.unwrap_or_else(today) })?;
            if json {
                print_json(&konti)?;
            } else {
                for k in konti {
                    println!(
                        "{:<12} {:<30} {:>14} {:>14}",
                        k.kontonummer, k.kontonavn, k.saldo, k.disponibel
                    );
                }
            }
        }

        Command::Budgetkonti { regnskab, dato } => {
            let konti = finans.query(BudgetkontoplanGet { regnskab, dato: dato.unwrap_or_else(today) })?;
            if json {
                print_json(&konti)?;
            } else {
                for k in konti {
                    println!(
                        "{:<12} {:<30} {:>14} {:>14} {:>14}",
                        k.kontonummer, k.kontonavn, k.budget, k.bogfort, k.disponibel
                    );
                }
            }
        }

        Command::Bogforingslinjer { regnskab, dato, antal } => {
            let linjer = finans.query(BogforingslinjerGet {
                regnskab,
                dato: dato.unwrap_or_else(today),
                antal,
            })?;
            if json {
                print_json(&linjer)?;
            } else {
                for l in linjer {
                    println!(
                        "{:>6} {} {:<12} {:<30} {:>12} {:>12}",
                        l.lobenummer, l.dato, l.kontonummer, l.tekst, l.debit, l.kredit
                    );
                }
            }
        }

        Command::Debitorer { regnskab, dato } => {
            let liste = finans.query(DebitorlisteGet { regnskab, dato: dato.unwrap_or_else(today) })?;
            print_adressekonti(&liste, json)?;
        }

        Command::Kreditorer { regnskab, dato } => {
            let liste = finans.query(KreditorlisteGet { regnskab, dato: dato.unwrap_or_else(today) })?;
            print_adressekonti(&liste, json)?;
        }

        Command::Adresseliste => {
            let liste = adresser.query(AdresselisteGet)?;
            if json {
                print_json(&liste)?;
            } else {
                for a in liste {
                    println!("{:>6}  {}", a.nummer(), a.navn());
                }
            }
        }

        Command::Telefonliste => {
            let liste = adresser.query(TelefonlisteGet)?;
            if json {
                print_json(&liste)?;
            } else {
                for t in liste {
                    println!(
                        "{:<30} {:<16} {}",
                        t.navn,
                        t.telefon,
                        t.mobil.as_deref().unwrap_or("")
                    );
                }
            }
        }

        Command::Events { entity_type, entity_id } => {
            let events = repo.events_for(&entity_type, &entity_id)?;
            if json {
                print_json(&events)?;
            } else {
                for e in events {
                    println!("{}  {:<28} {}", e.timestamp.to_rfc3339(), e.event_type, e.actor);
                }
            }
        }
    }

    Ok(())
}

fn print_adressekonti(liste: &[osintranet::service::finansstyring::Adressekonto], json: bool) -> Result<()> {
    if json {
        return print_json(&liste);
    }
    for a in liste {
        println!(
            "{:>6}  {:<30} {:<16} {:>14}",
            a.nummer,
            a.navn,
            a.telefon.as_deref().unwrap_or(""),
            a.saldo
        );
    }
    Ok(())
}
