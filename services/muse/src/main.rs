use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use muse_core::{
    DispatchedCall, GeminiClient, ProviderReply, SessionError, SessionOutcome, StructuredReply,
    ThoughtSession,
};
use muse_service::config::Config;
use muse_service::transcript::{TranscriptOutcome, triage};
use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc;
use tracing_subscriber::fmt::time::ChronoLocal;

/// Inputs multiplexed onto the control loop's single channel. The loop is
/// the only writer of session state; every other task just sends here.
enum Input {
    /// A command line typed by the user.
    Line(String),
    /// A finished provider call, tagged with its dispatch generation.
    Provider(u64, ProviderReply),
    /// An outcome delivered by the speech-capture collaborator.
    Transcript(TranscriptOutcome),
}

#[derive(Parser)]
struct Cli {
    /// An initial thought to process on startup
    thought: Option<String>,
}

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Think(String),
    Dictate(String),
    Pick(usize),
    Confirm,
    Debate,
    Rebut(String),
    End,
    Blog,
    Help,
    Quit,
    Unknown(String),
}

fn parse_command(line: &str) -> Command {
    let line = line.trim();
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };
    match verb {
        "think" => Command::Think(rest.to_string()),
        "dictate" => Command::Dictate(rest.to_string()),
        "pick" => rest
            .parse::<usize>()
            .map(Command::Pick)
            .unwrap_or_else(|_| Command::Unknown(line.to_string())),
        "confirm" => Command::Confirm,
        "debate" => Command::Debate,
        "rebut" => Command::Rebut(rest.to_string()),
        "end" => Command::End,
        "blog" => Command::Blog,
        "help" => Command::Help,
        "quit" | "exit" => Command::Quit,
        _ => Command::Unknown(line.to_string()),
    }
}

/// Runs one provider call off the control loop and delivers the reply back
/// over the input channel. The session decides on arrival whether the
/// generation is still current.
fn spawn_provider_call(call: DispatchedCall, client: Arc<GeminiClient>, tx: mpsc::Sender<Input>) {
    tokio::spawn(async move {
        let reply = call.request.execute(&*client).await;
        if tx.send(Input::Provider(call.generation, reply)).await.is_err() {
            tracing::warn!("control loop closed before a provider reply could be delivered");
        }
    });
}

fn report(err: SessionError) {
    match err {
        SessionError::Validation(e) => println!("! {e}"),
        SessionError::ProcessingFailed => {
            println!("! The AI returned no result after several attempts. Please try again.");
        }
        SessionError::Client(e) => println!("! Configuration problem: {e}"),
    }
}

fn print_pending(reply: &StructuredReply) {
    println!("\nYou (refined): {}", reply.corrected_text);
    println!("Choose a challenge question to continue your exploration:");
    for (i, question) in reply.challenge_questions.iter().enumerate() {
        println!("  Q{}: {}", i + 1, question);
    }
    println!("Commands: pick <1-3>, confirm, debate, blog.");
}

fn print_help() {
    println!("muse: explore a thought with an AI coach.");
    println!("  think <text>    process a thought (or a response to the focus question)");
    println!("  dictate <text>  deliver text as if transcribed from speech");
    println!("  pick <1-3>      select one of the challenge questions");
    println!("  confirm         confirm the selected focus and continue");
    println!("  debate          argue the refined statement against an AI opponent");
    println!("  rebut <text>    send your next debate argument");
    println!("  end             leave the debate (starts a fresh exploration)");
    println!("  blog            generate a blog-post summary of the journey");
    println!("  quit            exit");
}

fn submit(
    session: &mut ThoughtSession,
    text: &str,
    client: &Arc<GeminiClient>,
    tx: &mpsc::Sender<Input>,
) {
    match session.submit_thought(text) {
        Ok(call) => {
            println!("Processing your thought...");
            spawn_provider_call(call, client.clone(), tx.clone());
        }
        Err(err) => report(err),
    }
}

/// Handles one typed line. Returns `false` when the user asked to quit.
fn handle_line(
    session: &mut ThoughtSession,
    line: &str,
    client: &Arc<GeminiClient>,
    tx: &mpsc::Sender<Input>,
) -> bool {
    match parse_command(line) {
        Command::Think(text) => submit(session, &text, client, tx),
        Command::Dictate(text) => {
            // Stands in for the speech collaborator: the text re-enters the
            // loop through the same channel a real ingester would use.
            if tx
                .try_send(Input::Transcript(TranscriptOutcome::Success(text)))
                .is_err()
            {
                tracing::warn!("input channel full, dropping dictated text");
            }
        }
        Command::Pick(n) => {
            let question = session
                .pending()
                .and_then(|p| p.challenge_questions.get(n.wrapping_sub(1)).cloned());
            match question {
                Some(question) => match session.select_focus(&question) {
                    Ok(()) => println!("Selected focus: {question}"),
                    Err(err) => report(err),
                },
                None => {
                    println!("! pick expects 1-3 while a processed thought is awaiting selection");
                }
            }
        }
        Command::Confirm => match session.confirm_focus() {
            Ok(step) => {
                println!("You chose to focus on: \"{}\"", step.focus_question);
                println!(
                    "Step {}: respond to the question with 'think <text>'.",
                    session.current_step()
                );
            }
            Err(err) => report(err),
        },
        Command::Debate => match session.start_debate() {
            Ok(call) => {
                if let Some(opening) = session.debate_turns().first() {
                    println!("Entering debate mode. Arguing: \"{}\"", opening.text);
                }
                spawn_provider_call(call, client.clone(), tx.clone());
            }
            Err(err) => report(err),
        },
        Command::Rebut(text) => match session.submit_rebuttal(&text) {
            Ok(call) => {
                println!("Sending your rebuttal...");
                spawn_provider_call(call, client.clone(), tx.clone());
            }
            Err(err) => report(err),
        },
        Command::End => match session.end_debate() {
            Ok(()) => println!("Debate ended. Ready to start a new thought exploration."),
            Err(err) => report(err),
        },
        Command::Blog => match session.request_summary() {
            Ok(call) => {
                println!("Compiling your thought journey...");
                spawn_provider_call(call, client.clone(), tx.clone());
            }
            Err(err) => report(err),
        },
        Command::Help => print_help(),
        Command::Quit => return false,
        Command::Unknown(line) => {
            if !line.is_empty() {
                println!("! Unrecognized command: {line}. Type 'help' for the list.");
            }
        }
    }
    true
}

fn handle_reply(session: &mut ThoughtSession, generation: u64, reply: ProviderReply) {
    match session.apply(generation, reply) {
        Ok(SessionOutcome::ThoughtRefined(refined)) => print_pending(&refined),
        Ok(SessionOutcome::OpponentArgued(text)) => {
            println!("\nOpponent: {text}");
            println!("Your turn: 'rebut <text>', or 'end' to leave the debate.");
        }
        Ok(SessionOutcome::SummaryReady(text)) => {
            println!("\n--- Your Thought Journey ---\n{text}\n----------------------------");
        }
        Ok(SessionOutcome::Stale) => {}
        Err(err) => report(err),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // --- 1. Load Configuration ---
    let config = Config::from_env().context("Failed to load application configuration")?;

    // --- 2. Initialize Logging ---
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(ChronoLocal::rfc_3339())
        .init();

    tracing::info!("Configuration loaded successfully. Starting muse service...");

    // --- 3. Parse Command-Line Arguments ---
    let args = Cli::parse();

    // --- 4. Build the provider client and the control channel ---
    let client = Arc::new(GeminiClient::new(
        config.gemini_api_key.clone(),
        config.chat_model.clone(),
    ));
    let (input_tx, mut input_rx) = mpsc::channel::<Input>(64);

    // Feed stdin lines into the control loop.
    let line_tx = input_tx.clone();
    tokio::spawn(async move {
        let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if line_tx.send(Input::Line(line)).await.is_err() {
                break;
            }
        }
    });

    let mut session = ThoughtSession::new();
    print_help();

    if let Some(thought) = args.thought {
        submit(&mut session, &thought, &client, &input_tx);
    }

    // The control loop: the only place session state is touched.
    loop {
        tokio::select! {
            maybe_input = input_rx.recv() => {
                let Some(input) = maybe_input else { break };
                match input {
                    Input::Line(line) => {
                        if !handle_line(&mut session, &line, &client, &input_tx) {
                            break;
                        }
                    }
                    Input::Provider(generation, reply) => {
                        handle_reply(&mut session, generation, reply);
                    }
                    Input::Transcript(outcome) => {
                        let (text, status) = triage(outcome);
                        println!("{status}");
                        if let Some(text) = text {
                            submit(&mut session, &text, &client, &input_tx);
                        }
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Received Ctrl-C, shutting down...");
                break;
            }
        }
    }

    tracing::info!("Shutting down...");
    Ok(())
}
