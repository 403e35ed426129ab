use std::sync::Arc;

use fsgate_platform::filesystem::FileSystem;
use fsgate_platform::shell::Shell;
use tracing::warn;

use crate::config::GatewayConfig;
use crate::encoder;
use crate::exec::ExecHandler;
use crate::files::FileHandler;
use crate::protocol::{Request, Response};
use crate::resolver::PathResolver;

/// Entry point: takes one request, returns its response tuple. Never fails;
/// every error is folded into the response.
pub struct Gateway {
    files: FileHandler,
    exec: ExecHandler,
}

impl Gateway {
    pub fn new(config: GatewayConfig, fs: Arc<dyn FileSystem>, shell: Box<dyn Shell>) -> Self {
        Self::with_resolver(config, fs, shell, PathResolver::new())
    }

    pub fn with_resolver(
        config: GatewayConfig,
        fs: Arc<dyn FileSystem>,
        shell: Box<dyn Shell>,
        resolver: PathResolver,
    ) -> Self {
        Self {
            files: FileHandler::new(fs.clone(), resolver.clone(), config.clone()),
            exec: ExecHandler::new(shell, fs, resolver, config),
        }
    }

    pub async fn handle(&self, request: Request) -> Response {
        let op = request.op_name();
        let response = match request {
            Request::List(req) => {
                let raw = req
                    .dir
                    .clone()
                    .unwrap_or_else(|| self.files.default_directory().to_string());
                encoder::list_response(&raw, self.files.list(&req))
            }
            Request::Read(req) => encoder::read_response(self.files.read(&req)),
            Request::Write(req) => encoder::write_response(self.files.write(&req)),
            Request::Copy(req) => encoder::copy_response(self.files.copy(&req)),
            Request::MakeDir(req) => encoder::make_dir_response(self.files.make_dir(&req)),
            Request::Delete(req) => encoder::delete_response(self.files.delete(&req)),
            Request::Exec(req) => encoder::exec_response(self.exec.exec(&req).await),
        };

        if let Some(err) = response.error() {
            warn!("{} failed: {}", op, err);
        }
        response
    }
}
