use anyhow::{Context, Result};
use tokio::io::{AsyncRead, AsyncWrite};

use crate::engine::EngineHandle;
use crate::stream::{FrameReader, OutputWriter};

/// Counters reported at the end of a replay.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReplayStats {
    pub frames_read: u64,
    pub frames_emitted: u64,
}

/// Feed every frame from `input` through the session and write each output.
///
/// A rejected frame aborts the replay: it means the upstream producer broke
/// its contract, and later output would be built on a corrupt stream. Output
/// for the frames before it is still flushed.
pub async fn replay<R, W>(engine: &EngineHandle, input: R, output: W) -> Result<(ReplayStats, W)>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut reader = FrameReader::new(input);
    let mut writer = OutputWriter::new(output);
    let mut stats = ReplayStats::default();

    if let Err(e) = pump(engine, &mut reader, &mut writer, &mut stats).await {
        if let Err(flush) = writer.finish().await {
            tracing::warn!(error = %flush, "failed to flush output after abort");
        }
        tracing::error!(
            frames_read = stats.frames_read,
            frames_emitted = stats.frames_emitted,
            "replay aborted"
        );
        return Err(e);
    }

    let output = writer.finish().await?;
    tracing::info!(
        session = %engine.session_id(),
        frames_read = stats.frames_read,
        frames_emitted = stats.frames_emitted,
        "replay finished"
    );
    Ok((stats, output))
}

async fn pump<R, W>(
    engine: &EngineHandle,
    reader: &mut FrameReader<R>,
    writer: &mut OutputWriter<W>,
    stats: &mut ReplayStats,
) -> Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    while let Some((line, frame)) = reader.next_frame().await? {
        stats.frames_read += 1;
        let ts = frame.timestamp_us;
        let produced = engine
            .process(frame)
            .await
            .with_context(|| format!("frame on line {line} (timestamp {ts})"))?;
        if let Some(out) = produced {
            writer.write(&out).await?;
            stats.frames_emitted += 1;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::spawn_engine;
    use ocula_core::SessionOptions;

    const IRIS: &str = r#"[{"x":0.40,"y":0.50},{"x":0.42,"y":0.50},{"x":0.40,"y":0.48},{"x":0.38,"y":0.50},{"x":0.40,"y":0.52},
        {"x":0.60,"y":0.50},{"x":0.62,"y":0.50},{"x":0.60,"y":0.48},{"x":0.58,"y":0.50},{"x":0.60,"y":0.52}]"#;

    fn frame_line(ts: i64, extra: &str) -> String {
        let iris: String = IRIS.split_whitespace().collect();
        format!(r#"{{"timestamp_us":{ts},"iris":{iris},"image_size":{{"width":640,"height":480}}{extra}}}"#)
    }

    #[tokio::test]
    async fn test_replay_skips_empty_frames() {
        let engine = spawn_engine(SessionOptions::default(), 4).unwrap();
        let input = [
            frame_line(1, ""),
            r#"{"timestamp_us":2}"#.to_string(),
            frame_line(3, r#","left_iris_depth_mm":523.0"#),
        ]
        .join("\n");

        let (stats, out) = replay(&engine, input.as_bytes(), Vec::new()).await.unwrap();
        assert_eq!(
            stats,
            ReplayStats {
                frames_read: 3,
                frames_emitted: 2
            }
        );

        let text = String::from_utf8(out).unwrap();
        let outputs: Vec<serde_json::Value> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(outputs[0]["timestamp_us"], 1);
        assert_eq!(outputs[1]["timestamp_us"], 3);
        let last = outputs[1]["primitives"].as_array().unwrap().last().unwrap().clone();
        assert_eq!(last["kind"], "text");
        assert_eq!(last["label"]["display_text"], "Left : 52 cm");
    }

    #[tokio::test]
    async fn test_replay_aborts_on_bad_frame() {
        let engine = spawn_engine(SessionOptions::default(), 4).unwrap();
        let input = [
            frame_line(1, ""),
            r#"{"timestamp_us":2,"iris":[{"x":0.1,"y":0.1}],"image_size":{"width":640,"height":480}}"#
                .to_string(),
        ]
        .join("\n");

        let mut sink = Vec::new();
        let err = replay(&engine, input.as_bytes(), &mut sink).await.unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("line 2"), "{msg}");
        assert!(msg.contains("wrong number of iris landmarks: 1"), "{msg}");

        // Output for the frame before the rejected one is not lost.
        let text = String::from_utf8(sink).unwrap();
        let written: Vec<serde_json::Value> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(written.len(), 1);
        assert_eq!(written[0]["timestamp_us"], 1);
    }
}
