//! Line-oriented front end: each input line is one press of the submit
//! button, each outcome one alert.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::application::messages::FormCopy;
use crate::use_cases::waitlist::SubmissionController;

pub async fn run_terminal<R, W>(
    controller: &SubmissionController,
    input: R,
    mut output: W,
) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    output
        .write_all(format!("{}\n{}\n\n", FormCopy::TITLE, FormCopy::DISCLAIMER).as_bytes())
        .await?;

    let mut lines = input.lines();
    loop {
        output
            .write_all(format!("{} [{}]: ", FormCopy::PLACEHOLDER, FormCopy::BUTTON).as_bytes())
            .await?;
        output.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        controller.set_input(&line);
        let outcome = controller.submit(&line).await;
        if let Some(feedback) = outcome.feedback() {
            output
                .write_all(format!("[{}] {}\n", feedback.title, feedback.message).as_bytes())
                .await?;
        }
    }

    output.write_all(b"\n").await?;
    output.flush().await
}
