/*
 * This file is part of Radiobot.
 *
 * Copyright (C) 2024-present Radiobot developers
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program. If not, see <https://www.gnu.org/licenses/>.
 */

use std::io::{Read, Seek};

use anyhow::{anyhow, Context as _, Result};
use symphonia::core::io::MediaSource;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::stations::SegmentedSource;

/// Control handle for a running chunk-polling task. Dropping the handle does
/// not stop the task, `stop()` does. Stopping twice is a no-op.
pub struct FetcherHandle {
    stop_tx: mpsc::Sender<()>,
}

impl FetcherHandle {
    pub async fn stop(&self) {
        // The task exits on the first signal and drops the chunk sender,
        // which closes the byte stream. Later sends fail and are ignored.
        let _ = self.stop_tx.send(()).await;
    }
}

/// Fetches the station index, primes `prefetch` segments so playback does not
/// stutter while the driver buffers, then keeps polling one segment per
/// interval. Returns once priming is done.
pub async fn start(client: &reqwest::Client, source: &SegmentedSource) -> Result<(FetcherHandle, ChunkStream)> {
    let (handle, chunk_rx) = start_raw(client, source).await?;
    Ok((handle, ChunkStream::new(chunk_rx)))
}

pub(crate) async fn start_raw(client: &reqwest::Client, source: &SegmentedSource) -> Result<(FetcherHandle, UnboundedReceiver<Vec<u8>>)> {
    let index = client.get(source.index_url())
        .send().await
        .and_then(|response| response.error_for_status())
        .context("fetching station index")?
        .text().await
        .context("reading station index")?;
    let current_seq = parse_media_sequence(&index)
        .ok_or_else(|| anyhow!("no media sequence marker in index {}", source.index_url()))?;

    let (chunk_tx, chunk_rx) = mpsc::unbounded_channel();
    let mut next_seq = current_seq.saturating_sub(source.prefetch as u64);
    for _ in 0..source.prefetch {
        fetch_segment(client, source, &chunk_tx, &mut next_seq).await;
    }

    let (stop_tx, mut stop_rx) = mpsc::channel::<()>(1);
    let client = client.clone();
    let source = source.clone();
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(source.poll_interval);
        timer.tick().await; // the first tick completes immediately
        loop {
            tokio::select! {
                _ = timer.tick() => fetch_segment(&client, &source, &chunk_tx, &mut next_seq).await,
                _ = stop_rx.recv() => break,
            }
        }
        log::debug!("Chunk polling for {} stopped", source.index_url());
    });

    Ok((FetcherHandle { stop_tx }, chunk_rx))
}

/// Fetch one segment and append it to the stream. Fetches are issued one at a
/// time and the sequence advances even on failure; a missed segment is an
/// audible gap, not a retry backlog.
async fn fetch_segment(client: &reqwest::Client, source: &SegmentedSource, chunk_tx: &UnboundedSender<Vec<u8>>, seq: &mut u64) {
    let url = source.segment_url(*seq);
    match client.get(&url).send().await.and_then(|response| response.error_for_status()) {
        Ok(response) => match response.bytes().await {
            Ok(chunk) => {
                let _ = chunk_tx.send(chunk.to_vec());
                log::debug!("Chunk {} pushed", *seq);
            }
            Err(err) => log::error!("Error reading chunk {}: {err}", *seq),
        },
        Err(err) => log::error!("Error fetching chunk {}: {err}", *seq),
    }
    *seq += 1;
}

pub(crate) fn parse_media_sequence(index: &str) -> Option<u64> {
    index.lines()
        .find_map(|line| line.strip_prefix("#EXT-X-MEDIA-SEQUENCE:"))
        .and_then(|seq| seq.trim().parse().ok())
}

/// Receiving half of the fetcher's byte stream, bridged to the blocking
/// reader songbird drives on its own mixer thread. End of stream is the
/// channel closing, which happens exactly once when the polling task exits.
pub struct ChunkStream {
    chunk_rx: UnboundedReceiver<Vec<u8>>,
    pending: Vec<u8>,
    offset: usize,
}

impl ChunkStream {
    fn new(chunk_rx: UnboundedReceiver<Vec<u8>>) -> Self {
        Self { chunk_rx, pending: Vec::new(), offset: 0 }
    }
}

impl Read for ChunkStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        while self.offset >= self.pending.len() {
            match self.chunk_rx.blocking_recv() {
                Some(chunk) => {
                    self.pending = chunk;
                    self.offset = 0;
                }
                None => return Ok(0),
            }
        }

        let n = buf.len().min(self.pending.len() - self.offset);
        buf[..n].copy_from_slice(&self.pending[self.offset..self.offset + n]);
        self.offset += n;
        Ok(n)
    }
}

impl Seek for ChunkStream {
    fn seek(&mut self, _pos: std::io::SeekFrom) -> std::io::Result<u64> {
        // See is_seekable below
        unreachable!()
    }
}

impl MediaSource for ChunkStream {
    fn is_seekable(&self) -> bool {
        false
    }

    fn byte_len(&self) -> Option<u64> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::{
        matchers::{method, path},
        Mock, MockServer, ResponseTemplate,
    };

    const POLL: Duration = Duration::from_millis(200);

    fn source_for(server: &MockServer, prefetch: u32) -> SegmentedSource {
        SegmentedSource {
            base_url: server.uri() + "/live/",
            index_path: "chunklist.m3u8".to_owned(),
            segment_prefix: "media_".to_owned(),
            poll_interval: POLL,
            prefetch,
        }
    }

    async fn mount_index(server: &MockServer, seq: u64) {
        Mock::given(method("GET"))
            .and(path("/live/chunklist.m3u8"))
            .respond_with(ResponseTemplate::new(200).set_body_string(format!(
                "#EXTM3U\n#EXT-X-VERSION:3\n#EXT-X-MEDIA-SEQUENCE:{seq}\n#EXTINF:3.0,\nmedia_{seq}.aac\n"
            )))
            .mount(server)
            .await;
    }

    async fn mount_segment(server: &MockServer, seq: u64) {
        Mock::given(method("GET"))
            .and(path(format!("/live/media_{seq}.aac")))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(seq.to_string().into_bytes()))
            .mount(server)
            .await;
    }

    #[test]
    fn parses_media_sequence_line() {
        let index = "#EXTM3U\n#EXT-X-VERSION:3\n#EXT-X-MEDIA-SEQUENCE:118118216\n#EXTINF:3.0,\nmedia_118118216.aac\n";
        assert_eq!(parse_media_sequence(index), Some(118118216));
        assert_eq!(parse_media_sequence("#EXTM3U\n#EXTINF:3.0,\n"), None);
        assert_eq!(parse_media_sequence("#EXT-X-MEDIA-SEQUENCE:oops"), None);
    }

    #[tokio::test]
    async fn priming_appends_prefetch_segments_in_order() {
        let server = MockServer::start().await;
        mount_index(&server, 100).await;
        for seq in 98..=101 {
            mount_segment(&server, seq).await;
        }

        let client = reqwest::Client::new();
        let (handle, mut chunk_rx) = start_raw(&client, &source_for(&server, 2)).await.unwrap();

        // exactly the two primed segments, oldest first, nothing else yet
        assert_eq!(chunk_rx.try_recv().unwrap(), b"98");
        assert_eq!(chunk_rx.try_recv().unwrap(), b"99");
        assert!(chunk_rx.try_recv().is_err());

        handle.stop().await;
    }

    #[tokio::test]
    async fn polling_advances_one_segment_per_interval() {
        let server = MockServer::start().await;
        mount_index(&server, 100).await;
        for seq in 98..=100 {
            mount_segment(&server, seq).await;
        }

        let client = reqwest::Client::new();
        let (handle, mut chunk_rx) = start_raw(&client, &source_for(&server, 2)).await.unwrap();
        chunk_rx.try_recv().unwrap();
        chunk_rx.try_recv().unwrap();

        // one interval later the segment after the primed ones arrives
        let next = tokio::time::timeout(POLL * 3, chunk_rx.recv()).await.unwrap();
        assert_eq!(next.unwrap(), b"100");

        handle.stop().await;
    }

    #[tokio::test]
    async fn failed_segment_is_skipped_and_sequence_advances() {
        let server = MockServer::start().await;
        mount_index(&server, 100).await;
        mount_segment(&server, 99).await;
        // 100 is not mounted and 404s, 101 exists again
        mount_segment(&server, 101).await;

        let client = reqwest::Client::new();
        let (handle, mut chunk_rx) = start_raw(&client, &source_for(&server, 1)).await.unwrap();
        assert_eq!(chunk_rx.try_recv().unwrap(), b"99");

        // first tick fails on 100, second tick delivers 101
        let next = tokio::time::timeout(POLL * 5, chunk_rx.recv()).await.unwrap();
        assert_eq!(next.unwrap(), b"101");

        handle.stop().await;
    }

    #[tokio::test]
    async fn stop_closes_stream_once_and_kills_the_timer() {
        let server = MockServer::start().await;
        mount_index(&server, 100).await;
        for seq in 98..=110 {
            mount_segment(&server, seq).await;
        }

        let client = reqwest::Client::new();
        let (handle, mut chunk_rx) = start_raw(&client, &source_for(&server, 2)).await.unwrap();

        handle.stop().await;
        handle.stop().await; // idempotent

        // drain whatever was in flight; the channel must then report closed
        while let Some(_) = chunk_rx.recv().await {}
        let polled_before = server.received_requests().await.unwrap().len();

        tokio::time::sleep(POLL * 3).await;
        let polled_after = server.received_requests().await.unwrap().len();
        assert_eq!(polled_before, polled_after, "no fetch may happen after stop");
        assert!(chunk_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn chunk_stream_reads_segments_back_to_back() {
        let (chunk_tx, chunk_rx) = mpsc::unbounded_channel();
        chunk_tx.send(vec![1, 2, 3]).unwrap();
        chunk_tx.send(vec![4, 5]).unwrap();
        drop(chunk_tx);

        let mut stream = ChunkStream::new(chunk_rx);
        let bytes = tokio::task::spawn_blocking(move || {
            let mut bytes = Vec::new();
            stream.read_to_end(&mut bytes).unwrap();
            bytes
        }).await.unwrap();
        assert_eq!(bytes, vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn missing_sequence_marker_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/live/chunklist.m3u8"))
            .respond_with(ResponseTemplate::new(200).set_body_string("#EXTM3U\n"))
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        assert!(start_raw(&client, &source_for(&server, 2)).await.is_err());
    }
}
