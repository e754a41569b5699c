//! Async drivers feeding grammar parsers from chunked sources.

#[cfg(feature = "tokio")]
mod tokio_tests {
    use pullkit::async_stream::StreamError;
    use pullkit::async_stream::tokio_impl::ChannelParser;
    use pullkit::recon::{BlockParser, ValueModel, parse};
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_channel_recon_document() {
        let (tx, rx) = mpsc::channel::<String>(8);
        let handle = tokio::spawn(ChannelParser::new(BlockParser::<ValueModel>::new(), rx).run());
        for chunk in ["@point{", "x: 1,", " y: [two", " @b[parts]]", "}"] {
            tx.send(chunk.to_owned()).await.unwrap();
        }
        drop(tx);
        let value = handle.await.unwrap().unwrap();
        assert_eq!(value, parse("@point{x:1,y:[two @b[parts]]}").unwrap());
    }

    #[tokio::test]
    async fn test_channel_reports_parse_error() {
        let (tx, rx) = mpsc::channel::<String>(8);
        tx.send("{a:1".to_owned()).await.unwrap();
        tx.send(" b}".to_owned()).await.unwrap();
        drop(tx);
        let result = ChannelParser::new(BlockParser::<ValueModel>::new(), rx).run().await;
        assert!(matches!(result, Err(StreamError::Parse(_))));
    }

    #[tokio::test]
    async fn test_channel_incomplete_record() {
        let (tx, rx) = mpsc::channel::<String>(8);
        tx.send("{a:".to_owned()).await.unwrap();
        drop(tx);
        let result = ChannelParser::new(BlockParser::<ValueModel>::new(), rx).run().await;
        assert!(result.is_err());
    }
}

#[cfg(feature = "futures")]
mod futures_tests {
    use futures_core::Stream;
    use pullkit::async_stream::futures_impl::ParseFuture;
    use pullkit::http::{Method, RequestParser};
    use pullkit::async_stream::{StreamConfig, StreamError};
    use std::future::Future;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    struct Chunks {
        chunks: Vec<String>,
        index: usize,
    }

    impl Chunks {
        fn new(chunks: &[&str]) -> Self {
            Self {
                chunks: chunks.iter().map(|chunk| chunk.to_string()).collect(),
                index: 0,
            }
        }
    }

    impl Stream for Chunks {
        type Item = String;

        fn poll_next(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Option<String>> {
            if self.index < self.chunks.len() {
                let chunk = self.chunks[self.index].clone();
                self.index += 1;
                Poll::Ready(Some(chunk))
            } else {
                Poll::Ready(None)
            }
        }
    }

    fn poll_once<F: Future + Unpin>(mut future: F) -> Poll<F::Output> {
        let waker = std::task::Waker::noop();
        let mut cx = Context::from_waker(waker);
        Pin::new(&mut future).poll(&mut cx)
    }

    #[test]
    fn test_request_head_from_stream() {
        let chunks = Chunks::new(&["GET /st", "atus HTTP/1.1\r\nHo", "st: a\r\n", "\r\n"]);
        let Poll::Ready(head) = poll_once(ParseFuture::new(chunks, RequestParser::new())) else {
            panic!("ready stream should resolve");
        };
        let head = head.unwrap();
        assert_eq!(head.method, Method::Get);
        assert_eq!(head.target, "/status");
        assert_eq!(head.headers.host(), Some("a"));
    }

    #[test]
    fn test_chunk_limit() {
        let chunks = Chunks::new(&["GET / HTTP/1.1\r\n\r\n"]);
        let config = StreamConfig::from_chunk_size(4);
        let future = ParseFuture::with_config(chunks, RequestParser::new(), config);
        assert!(matches!(
            poll_once(future),
            Poll::Ready(Err(StreamError::ChunkTooLarge { .. }))
        ));
    }
}
