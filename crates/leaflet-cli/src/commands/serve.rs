use leaflet_core::handlers::Handlers;
use leaflet_core::sync::CloudExchange;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::CliError;

/// Read one JSON request per line and write one JSON response per line
/// until the input closes. Blank lines are ignored.
pub async fn serve<C, R, W>(
    handlers: &Handlers<C>,
    reader: R,
    mut writer: W,
) -> Result<usize, CliError>
where
    C: CloudExchange,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    let mut handled = 0;

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let response = handlers.handle_json(&line).await;
        let mut encoded = serde_json::to_vec(&response)?;
        encoded.push(b'\n');
        writer.write_all(&encoded).await?;
        writer.flush().await?;
        handled += 1;
    }

    tracing::info!("Input closed after {handled} request(s)");
    Ok(handled)
}
