use super::{Chunks, ChunksError};

#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    ChunksError(ChunksError),
    InvalidPayload,
}

/// A server-sent event with its optional type and joined data lines.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SseEvent {
    pub event: Option<String>,
    pub data: String,
}

/// A type for reading server-sent events from a chunk stream.
pub struct Sse {
    buf: Vec<u8>,
    chunks: Chunks,
    exhausted: bool,
}

impl Sse {
    #[inline]
    pub fn new(chunks: Chunks) -> Self {
        Self {
            buf: Vec::new(),
            chunks,
            exhausted: false,
        }
    }

    pub async fn next_event(&mut self) -> Result<Option<SseEvent>, Error> {
        loop {
            // Drain complete events from the buffer before reading more.
            if let Some(event) = self.try_parse_event()? {
                return Ok(Some(event));
            }
            if self.exhausted {
                // A trailing partial event is dropped.
                return Ok(None);
            }

            match self.chunks.next_chunk().await.map_err(Error::ChunksError)? {
                // Bytes are kept raw until a whole event is buffered, since a
                // chunk may end in the middle of a UTF-8 sequence. CR is
                // dropped so that CRLF line endings look like LF.
                Some(bytes) => {
                    self.buf.extend(bytes.iter().filter(|b| **b != b'\r'))
                }
                None => self.exhausted = true,
            }
        }
    }

    fn try_parse_event(&mut self) -> Result<Option<SseEvent>, Error> {
        // event         = *( comment / field ) end-of-line
        // comment       = colon *any-char end-of-line
        // field         = 1*name-char [ colon [ space ] *any-char ] end-of-line
        while let Some(eol_idx) = find_blank_line(&self.buf) {
            let block: Vec<u8> = self.buf.drain(0..eol_idx + 2).collect();
            let Ok(block) = str::from_utf8(&block[..eol_idx]) else {
                return Err(Error::InvalidPayload);
            };

            let mut event = None;
            let mut data: Option<String> = None;
            for line in block.lines() {
                if line.is_empty() || line.starts_with(':') {
                    continue;
                }
                let (field, value) = match line.split_once(':') {
                    Some((field, value)) => {
                        (field, value.strip_prefix(' ').unwrap_or(value))
                    }
                    None => (line, ""),
                };
                match field {
                    "event" => event = Some(value.to_owned()),
                    "data" => {
                        let data = data.get_or_insert_default();
                        if !data.is_empty() {
                            data.push('\n');
                        }
                        data.push_str(value);
                    }
                    "id" | "retry" => {}
                    _ => return Err(Error::InvalidPayload),
                }
            }

            // Blocks without data (e.g. only comments) dispatch nothing.
            if let Some(data) = data {
                return Ok(Some(SseEvent { event, data }));
            }
        }
        Ok(None)
    }
}

#[inline]
fn find_blank_line(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\n\n")
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;

    fn sse_from(chunks: &[&'static [u8]]) -> Sse {
        let chunks = chunks.iter().copied().map(Bytes::from_static).collect();
        Sse::new(Chunks::from_vec_deque(chunks))
    }

    fn data(event: Option<&str>, data: &str) -> SseEvent {
        SseEvent {
            event: event.map(ToOwned::to_owned),
            data: data.to_owned(),
        }
    }

    #[tokio::test]
    async fn test_normal_events() {
        let mut sse = sse_from(&[
            b"event: message_start\ndata: hello\n\n",
            b"event: ping\ndata: bye\n\n",
        ]);
        assert_eq!(
            sse.next_event().await.unwrap(),
            Some(data(Some("message_start"), "hello"))
        );
        assert_eq!(
            sse.next_event().await.unwrap(),
            Some(data(Some("ping"), "bye"))
        );
        assert_eq!(sse.next_event().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_quirk_streaming() {
        let mut sse =
            sse_from(&[b"data:", b" hello\n", b"\n", b"data:bye\r\n\r\n"]);
        assert_eq!(sse.next_event().await.unwrap(), Some(data(None, "hello")));
        assert_eq!(sse.next_event().await.unwrap(), Some(data(None, "bye")));
        assert_eq!(sse.next_event().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_split_utf8_and_multiline() {
        // "é" is 0xC3 0xA9, split across two chunks.
        let mut sse = sse_from(&[
            b": keep-alive\n\n",
            b"data: caf\xC3",
            b"\xA9\ndata: au lait\n\n",
        ]);
        assert_eq!(
            sse.next_event().await.unwrap(),
            Some(data(None, "café\nau lait"))
        );
        assert_eq!(sse.next_event().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_invalid_data() {
        let mut sse = sse_from(&[b"xxxxxx\n\n"]);
        assert_eq!(sse.next_event().await.unwrap_err(), Error::InvalidPayload);

        let mut sse = sse_from(&[b"xxxxxx\n"]);
        assert_eq!(sse.next_event().await.unwrap(), None);

        let mut sse = sse_from(&[b"data: hello\n", b"data: bye\n"]);
        assert_eq!(sse.next_event().await.unwrap(), None);

        let mut sse = sse_from(&[b"data: \xFF\n\n"]);
        assert_eq!(sse.next_event().await.unwrap_err(), Error::InvalidPayload);
    }
}
