use echo_service::EchoService;
use echo_service::pb::{EchoRequest, EchoResponse, ProfileRequest, ProfileResponse};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tonic::{Request, Response, Status};

pub struct EchoServiceImpl;

#[tonic::async_trait]
impl EchoService for EchoServiceImpl {
    type ServerStreamingEchoStream = ReceiverStream<Result<EchoResponse, Status>>;

    async fn unary_echo(
        &self,
        request: Request<EchoRequest>,
    ) -> Result<Response<EchoResponse>, Status> {
        let suffix = request
            .metadata()
            .get("x-echo-suffix")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let mut message = request.into_inner().message;
        if let Some(suffix) = suffix {
            message.push_str(&suffix);
        }

        Ok(Response::new(EchoResponse { message }))
    }

    async fn echo_profile(
        &self,
        request: Request<ProfileRequest>,
    ) -> Result<Response<ProfileResponse>, Status> {
        Ok(Response::new(ProfileResponse {
            profile: request.into_inner().profile,
        }))
    }

    async fn fail(&self, request: Request<EchoRequest>) -> Result<Response<EchoResponse>, Status> {
        Err(Status::failed_precondition(request.into_inner().message))
    }

    async fn server_streaming_echo(
        &self,
        request: Request<EchoRequest>,
    ) -> Result<Response<Self::ServerStreamingEchoStream>, Status> {
        let msg = request.into_inner().message;
        let (tx, rx) = mpsc::channel(4);

        tokio::spawn(async move {
            for i in 0..3 {
                let response = EchoResponse {
                    message: format!("{msg} - seq {i}"),
                };
                tx.send(Ok(response)).await.ok();
            }
        });

        Ok(Response::new(ReceiverStream::new(rx)))
    }
}
