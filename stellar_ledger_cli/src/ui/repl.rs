use std::io::{stdout, Write};

use log::debug;
use stellar_ledger_core::{MethodName, TransportKind};
use tokio::io::{self, AsyncBufReadExt, BufReader};

use crate::ui::cli::print_methods;
use crate::ui::console::Console;

const HELP: &str = "\
Commands:
  connect [usb|hid]           open the device (default transport from settings)
  disconnect                  release the device
  status                      show the connection state
  methods                     list methods and parameters
  call <method> [key=value]   run a method; 'call' may be omitted,
                              quote values with spaces: message=\"hello world\"
  help                        this text
  quit                        disconnect and leave";

#[derive(Debug, PartialEq, Eq)]
enum ReplCommand {
    Connect(Option<String>),
    Disconnect,
    Status,
    Methods,
    Call { method: String, params: Vec<String> },
    Help,
    Quit,
    Empty,
}

/// Split on whitespace, keeping double-quoted runs together so that
/// `message="hello world"` stays one word. Single quotes are literal since
/// they mark hardened path components.
fn split_words(line: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quoted = false;
    for c in line.chars() {
        match c {
            '"' => {
                quoted = !quoted;
                in_word = true;
            }
            c if c.is_whitespace() && !quoted => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            c => {
                current.push(c);
                in_word = true;
            }
        }
    }
    if in_word {
        words.push(current);
    }
    words
}

fn parse_line(line: &str) -> ReplCommand {
    let mut words = split_words(line).into_iter();
    let Some(head) = words.next() else {
        return ReplCommand::Empty;
    };
    match head.as_str() {
        "connect" => ReplCommand::Connect(words.next()),
        "disconnect" => ReplCommand::Disconnect,
        "status" => ReplCommand::Status,
        "methods" => ReplCommand::Methods,
        "help" | "?" => ReplCommand::Help,
        "quit" | "exit" => ReplCommand::Quit,
        "call" => ReplCommand::Call {
            method: words.next().unwrap_or_default(),
            params: words.collect(),
        },
        _ => ReplCommand::Call {
            method: head,
            params: words.collect(),
        },
    }
}

fn prompt(console: &Console) {
    print!("[{}] > ", console.status_text().lines().next().unwrap_or_default());
    let _ = stdout().flush();
}

/// Read commands from stdin until `quit` or end of input.
pub async fn run(console: Console) -> io::Result<()> {
    println!("Stellar Ledger API console. Type 'help' for commands.");
    let mut lines = BufReader::new(io::stdin()).lines();
    prompt(&console);

    while let Some(line) = lines.next_line().await? {
        let command = parse_line(&line);
        debug!("REPL command: {:?}", command);
        match command {
            ReplCommand::Empty => {}
            ReplCommand::Help => println!("{}", HELP),
            ReplCommand::Methods => print_methods(),
            ReplCommand::Status => println!("{}", console.status_text()),
            ReplCommand::Connect(kind) => {
                let kind = match kind.map(|k| k.parse::<TransportKind>()).transpose() {
                    Ok(kind) => kind,
                    Err(e) => {
                        eprintln!("Error: {}", e);
                        prompt(&console);
                        continue;
                    }
                };
                match console.connect(kind).await {
                    Ok(()) => println!("{}", console.status_text()),
                    Err(e) => eprintln!("Error: {}\n{}", e, console.status_text()),
                }
            }
            ReplCommand::Disconnect => {
                console.disconnect().await;
                println!("{}", console.status_text());
            }
            ReplCommand::Call { method, params } => {
                if let Ok(name) = method.parse::<MethodName>() {
                    println!("{}: {}", name.title(), name.description());
                }
                match console.call(&method, &params).await {
                    Ok(text) => println!("{}", text),
                    Err(e) => eprintln!("Error: {}", e),
                }
            }
            ReplCommand::Quit => break,
        }
        prompt(&console);
    }

    console.disconnect().await;
    Ok(())
}
