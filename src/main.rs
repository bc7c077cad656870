use clap::Parser;
use std::collections::HashMap;
use std::io::Read;

use sandbash::shell::{Shell, ShellOptions};
use sandbash::ShellOpts;

#[derive(Parser)]
#[command(name = "sandbash")]
#[command(about = "A sandboxed bash interpreter over a virtual filesystem")]
#[command(version)]
struct Cli {
    /// Execute the script given on the command line
    #[arg(short = 'c')]
    script: Option<String>,

    /// Exit immediately when a command fails (set -e)
    #[arg(short = 'e', long = "errexit")]
    errexit: bool,

    /// Working directory inside the sandbox
    #[arg(long = "cwd")]
    cwd: Option<String>,

    /// Seed the virtual filesystem from a JSON object of path -> content
    #[arg(long = "files")]
    files: Option<String>,

    /// Print the result as JSON (stdout, stderr, exitCode)
    #[arg(long = "json")]
    json: bool,

    /// Script file to execute (read from the host filesystem)
    #[arg()]
    script_file: Option<String>,
}

#[tokio::main(flavor = "multi_thread")]
async fn main() {
    let cli = Cli::parse();

    let script = if let Some(s) = cli.script {
        s
    } else if let Some(ref file) = cli.script_file {
        match std::fs::read_to_string(file) {
            Ok(content) => content,
            Err(e) => {
                eprintln!("sandbash: cannot read script file {}: {}", file, e);
                std::process::exit(1);
            }
        }
    } else {
        use std::io::IsTerminal;
        if std::io::stdin().is_terminal() {
            eprintln!("sandbash: no script; use -c 'script', a script file, or pipe via stdin");
            std::process::exit(2);
        }
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf).unwrap_or_default();
        buf
    };

    let files: Option<HashMap<String, String>> = match cli.files {
        Some(ref spec) => match serde_json::from_str(spec) {
            Ok(map) => Some(map),
            Err(e) => {
                eprintln!("sandbash: --files must be a JSON object: {}", e);
                std::process::exit(2);
            }
        },
        None => None,
    };

    let shell_opts = cli.errexit.then(|| ShellOpts { errexit: true, ..Default::default() });

    let mut shell = Shell::new(ShellOptions {
        cwd: cli.cwd,
        files,
        shell_opts,
        ..Default::default()
    })
    .await;

    let result = shell.exec(&script).await;

    if cli.json {
        println!(
            "{}",
            serde_json::json!({
                "stdout": result.stdout,
                "stderr": result.stderr,
                "exitCode": result.exit_code,
            })
        );
    } else {
        if !result.stdout.is_empty() {
            print!("{}", result.stdout);
        }
        if !result.stderr.is_empty() {
            eprint!("{}", result.stderr);
        }
    }

    std::process::exit(result.exit_code);
}
