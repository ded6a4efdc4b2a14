/*
Copyright 2022 Volker Schwaberow <volker@schwaberow.de>
Permission is hereby granted, free of charge, to any person obtaining a
copy of this software and associated documentation files (the
"Software"), to deal in the Software without restriction, including without
limitation the rights to use, copy, modify, merge, publish, distribute,
sublicense, and/or sell copies of the Software, and to permit persons to whom the
Software is furnished to do so, subject to the following conditions:
The above copyright notice and this permission notice shall be
included in all copies or substantial portions of the Software.
THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS
OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT
SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR
OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE,
ARISING FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
DEALINGS IN THE SOFTWARE.
Author(s): Volker Schwaberow
*/
use anyhow::Context;
use clap::Parser;
use log::info;
use shadowprobe::cli::Cli;
use shadowprobe::replay;
use simple_logger::SimpleLogger;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    SimpleLogger::new()
        .with_level(cli.log_level())
        .init()
        .context("failed to initialise logger")?;

    if cli.no_color {
        colored::control::set_override(false);
    }

    let requests = replay::load_requests(&cli)?;
    if requests.is_empty() {
        println!("No requests to replay.");
        return Ok(());
    }
    info!(
        "Replaying {} requests against {} and {}",
        requests.len(),
        cli.default_url,
        cli.alternative_url
    );

    let summary = replay::run(&cli, requests).await?;
    replay::print_summary(&summary, cli.json)?;
    Ok(())
}
