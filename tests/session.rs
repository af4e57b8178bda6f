//! Whole-session flow over a real socket: connect, register, join,
//! take a command, quit cleanly.

mod common;

use std::sync::Arc;

use basalt::commands::{Command, CommandHandler, CommandRegistry};
use basalt::context::Context;
use basalt::events::register_default_hooks;
use basalt::hooks::HookRegistryBuilder;
use basalt::supervisor;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;

#[tokio::test]
async fn test_full_session_quits_cleanly() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let (read, mut write) = stream.into_split();
        let mut lines = BufReader::new(read).lines();

        // Registration burst ends with USER.
        loop {
            let line = lines.next_line().await.unwrap().unwrap();
            if line.starts_with("USER") {
                break;
            }
        }
        write
            .write_all(b":irc.example.net 376 basalt :End of /MOTD\r\n")
            .await
            .unwrap();

        let join = lines.next_line().await.unwrap().unwrap();
        assert_eq!(join, "JOIN #test");

        write
            .write_all(b":alice!a@h PRIVMSG #test :,quit\r\n")
            .await
            .unwrap();

        // The engine announces the quit before closing.
        loop {
            let Some(line) = lines.next_line().await.unwrap() else {
                panic!("connection closed before QUIT");
            };
            if line.starts_with("QUIT") {
                assert_eq!(line, "QUIT :bye");
                break;
            }
        }
    });

    let mut config = common::test_config();
    config.server = "127.0.0.1".to_string();
    config.port = port;
    config.channels = vec!["#test".to_string()];
    config.quit_msg = "bye".to_string();

    let mut hooks = HookRegistryBuilder::new();
    register_default_hooks(&mut hooks);

    let quit: CommandHandler = Arc::new(|_event, conn, ctx| {
        Box::pin(async move {
            conn.disconnect(&ctx.config.quit_msg).await;
            Ok(())
        })
    });
    let mut commands = CommandRegistry::new(true);
    commands.add(Command::new("quit", quit)).unwrap();

    let ctx = Arc::new(Context::new(config, hooks.build(), commands));
    let code = supervisor::run(ctx).await;

    assert_eq!(code, 0);
    server.await.unwrap();
}
