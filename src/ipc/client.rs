//! CLI-side IPC client for the execution server

use futures_util::stream::{self, Stream as FuturesStream};
use tokio::io::{AsyncRead, AsyncWrite, ReadHalf};

use crate::common::{Error, Result};

use super::protocol::{ExecutionRequest, ExecutionResponse};
use super::transport::{self, Stream};

/// Client for submitting runs to the execution server
pub struct ExecutionClient<S = Stream> {
    stream: S,
}

impl ExecutionClient<Stream> {
    /// Connect to the running server
    pub async fn connect() -> Result<Self> {
        let stream = transport::connect().await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound
                || e.kind() == std::io::ErrorKind::ConnectionRefused
            {
                Error::ServerNotRunning
            } else {
                Error::ConnectionFailed(e)
            }
        })?;

        Ok(Self { stream })
    }
}

impl<S> ExecutionClient<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    /// Wrap an already connected stream
    pub fn from_stream(stream: S) -> Self {
        Self { stream }
    }

    /// Submit a run and return the response stream
    ///
    /// The stream ends after a terminal response (`SuiteEnd` or
    /// `ErrorResult`). If the connection closes before that, the last item
    /// is an [`Error::UnexpectedEndOfStream`].
    pub async fn execute(
        self,
        specs: Vec<String>,
    ) -> Result<impl FuturesStream<Item = Result<ExecutionResponse>>> {
        let (reader, mut writer) = tokio::io::split(self.stream);

        let request = ExecutionRequest { specs };
        transport::send_json(&mut writer, &request)
            .await
            .map_err(|e| Error::Communication(e.to_string()))?;
        tracing::debug!(specs = ?request.specs, "Submitted execution request");

        Ok(stream::unfold(
            ResponseReader::Open { reader, _writer: writer },
            |state| async move { state.next().await },
        ))
    }
}

/// State of the response stream
enum ResponseReader<S> {
    Open {
        reader: ReadHalf<S>,
        // Held so the server does not see a half-closed connection
        _writer: tokio::io::WriteHalf<S>,
    },
    Done,
}

impl<S: AsyncRead + AsyncWrite + Unpin> ResponseReader<S> {
    async fn next(self) -> Option<(Result<ExecutionResponse>, Self)> {
        let Self::Open { mut reader, _writer } = self else {
            return None;
        };

        match transport::recv_message(&mut reader).await {
            Ok(data) => match serde_json::from_slice::<ExecutionResponse>(&data) {
                Ok(response) if response.kind.is_terminal() => Some((Ok(response), Self::Done)),
                Ok(response) => Some((Ok(response), Self::Open { reader, _writer })),
                Err(e) => Some((
                    Err(Error::Protocol(format!("Invalid response: {}", e))),
                    Self::Done,
                )),
            },
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                Some((Err(Error::unexpected_end("SuiteEnd")), Self::Done))
            }
            Err(e) => Some((Err(Error::Communication(e.to_string())), Self::Done)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ipc::protocol::ResponseType;
    use futures_util::StreamExt;

    #[tokio::test]
    async fn test_stream_stops_after_suite_end() {
        let (client_io, mut server_io) = tokio::io::duplex(4096);

        let server = tokio::spawn(async move {
            let request: ExecutionRequest = transport::recv_json(&mut server_io).await.unwrap();
            assert_eq!(request.specs, vec!["specs"]);
            for kind in [ResponseType::SuiteStart, ResponseType::SuiteEnd] {
                transport::send_json(&mut server_io, &ExecutionResponse::bare(kind))
                    .await
                    .unwrap();
            }
            // Anything after SuiteEnd must be ignored by the client
            transport::send_json(&mut server_io, &ExecutionResponse::bare(ResponseType::SpecStart))
                .await
                .unwrap();
            server_io
        });

        let client = ExecutionClient::from_stream(client_io);
        let responses: Vec<_> = client
            .execute(vec!["specs".to_string()])
            .await
            .unwrap()
            .collect()
            .await;

        let kinds: Vec<_> = responses.into_iter().map(|r| r.unwrap().kind).collect();
        assert_eq!(kinds, vec![ResponseType::SuiteStart, ResponseType::SuiteEnd]);
        drop(server.await.unwrap());
    }

    #[tokio::test]
    async fn test_early_close_yields_error() {
        let (client_io, mut server_io) = tokio::io::duplex(4096);

        let server = tokio::spawn(async move {
            let _: ExecutionRequest = transport::recv_json(&mut server_io).await.unwrap();
            transport::send_json(&mut server_io, &ExecutionResponse::bare(ResponseType::SuiteStart))
                .await
                .unwrap();
        });

        let client = ExecutionClient::from_stream(client_io);
        let responses: Vec<_> = client
            .execute(vec!["specs".to_string()])
            .await
            .unwrap()
            .collect()
            .await;
        server.await.unwrap();

        assert_eq!(responses.len(), 2);
        assert!(responses[0].is_ok());
        assert!(matches!(
            responses[1],
            Err(Error::UnexpectedEndOfStream { .. })
        ));
    }
}
