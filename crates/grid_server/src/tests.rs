// End-to-end tests against a live server on an ephemeral port
#[cfg(test)]
mod tests {
    use crate::*;
    use std::net::SocketAddr;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
    use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
    use tokio::net::TcpStream;

    const RECV_TIMEOUT: Duration = Duration::from_secs(2);
    const QUIET_PERIOD: Duration = Duration::from_millis(300);

    struct TestClient {
        lines: Lines<BufReader<OwnedReadHalf>>,
        writer: OwnedWriteHalf,
    }

    impl TestClient {
        async fn connect(addr: SocketAddr) -> Self {
            let stream = TcpStream::connect(addr).await.expect("connect");
            let (read_half, writer) = stream.into_split();
            Self {
                lines: BufReader::new(read_half).lines(),
                writer,
            }
        }

        async fn send(&mut self, line: &str) {
            self.writer
                .write_all(format!("{line}\n").as_bytes())
                .await
                .expect("write");
        }

        async fn recv(&mut self) -> String {
            tokio::time::timeout(RECV_TIMEOUT, self.lines.next_line())
                .await
                .expect("timed out waiting for a line")
                .expect("read")
                .expect("connection closed early")
        }

        /// Reads a `BOARD` header and its rows.
        async fn recv_board(&mut self, dimension: usize) -> Vec<String> {
            let mut board = vec![self.recv().await];
            assert_eq!(board[0], "BOARD");
            for _ in 0..dimension {
                board.push(self.recv().await);
            }
            board
        }

        /// Collects lines until the server goes quiet.
        async fn drain(&mut self) -> Vec<String> {
            let mut lines = Vec::new();
            while let Ok(Ok(Some(line))) =
                tokio::time::timeout(QUIET_PERIOD, self.lines.next_line()).await
            {
                lines.push(line);
            }
            lines
        }

        async fn expect_closed(&mut self) {
            let next = tokio::time::timeout(RECV_TIMEOUT, self.lines.next_line())
                .await
                .expect("timed out waiting for close");
            assert!(matches!(next, Ok(None) | Err(_)), "unexpected {next:?}");
        }
    }

    async fn spawn_server(config: ServerConfig) -> (Arc<GameServer>, SocketAddr) {
        let config = ServerConfig {
            bind_address: "127.0.0.1:0".parse().expect("valid address"),
            ..config
        };
        let server = Arc::new(create_server_with_config(config));
        let listener = server.bind().await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        {
            let server = server.clone();
            tokio::spawn(async move { server.serve(listener, None).await });
        }
        (server, addr)
    }

    /// Two connected clients in a started two-player game, streams drained.
    async fn started_game(addr: SocketAddr) -> (TestClient, TestClient) {
        let mut x = TestClient::connect(addr).await;
        let mut o = TestClient::connect(addr).await;
        x.send("CREATE 2").await;
        assert_eq!(x.recv().await, "CREATED 1");
        assert_eq!(x.recv().await, "JOINED X");
        assert_eq!(x.recv().await, "WAIT");

        o.send("JOIN 1").await;
        assert_eq!(o.recv().await, "JOINED O");
        o.recv_board(3).await;
        x.recv_board(3).await;
        assert_eq!(x.recv().await, "YOURTURN");
        (x, o)
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_lobby_listing() {
        let (_server, addr) = spawn_server(ServerConfig::default()).await;
        let mut host = TestClient::connect(addr).await;
        let mut guest = TestClient::connect(addr).await;

        guest.send("LIST").await;
        assert_eq!(guest.recv().await, "GAMES ");

        host.send("create 3").await;
        assert_eq!(host.recv().await, "CREATED 1");
        assert_eq!(host.recv().await, "JOINED X");
        assert_eq!(host.recv().await, "WAIT");

        guest.send("").await;
        guest.send("  List  now ").await;
        assert_eq!(guest.recv().await, "GAMES 1:3:1");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_full_game_to_a_win() {
        let (server, addr) = spawn_server(ServerConfig::default()).await;
        let (mut x, mut o) = started_game(addr).await;

        x.send("MOVE 0 0").await;
        x.recv_board(3).await;
        assert_eq!(o.recv_board(3).await[1], "X . .");
        assert_eq!(o.recv().await, "YOURTURN");

        o.send("MOVE 1 0").await;
        o.recv_board(3).await;
        x.recv_board(3).await;
        assert_eq!(x.recv().await, "YOURTURN");

        x.send("MOVE 0 1").await;
        x.recv_board(3).await;
        o.recv_board(3).await;
        assert_eq!(o.recv().await, "YOURTURN");

        o.send("MOVE 1 1").await;
        o.recv_board(3).await;
        x.recv_board(3).await;
        assert_eq!(x.recv().await, "YOURTURN");

        x.send("MOVE 0 2").await;
        let expected = vec!["BOARD", "X X X", "O O .", ". . ."];
        assert_eq!(x.recv_board(3).await, expected);
        assert_eq!(x.recv().await, "WIN");
        assert_eq!(o.recv_board(3).await, expected);
        assert_eq!(o.recv().await, "LOSE");

        let stats = server.get_session_registry().stats().await;
        assert_eq!(stats.ended, 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_invalid_moves_keep_the_turn() {
        let (_server, addr) = spawn_server(ServerConfig::default()).await;
        let (mut x, mut o) = started_game(addr).await;

        x.send("MOVE 3 0").await;
        assert_eq!(x.recv().await, "INVALID Out of bounds");
        assert_eq!(x.recv().await, "YOURTURN");

        x.send("MOVE -1 0").await;
        assert_eq!(x.recv().await, "INVALID Out of bounds");
        assert_eq!(x.recv().await, "YOURTURN");

        x.send("MOVE one two").await;
        assert_eq!(
            x.recv().await,
            "INVALID Invalid move format (use: MOVE <row> <col>)"
        );
        assert_eq!(x.recv().await, "YOURTURN");

        o.send("MOVE 0 0").await;
        assert_eq!(o.recv().await, "INVALID Not your turn");

        x.send("MOVE 2 2").await;
        x.recv_board(3).await;
        o.recv_board(3).await;
        assert_eq!(o.recv().await, "YOURTURN");

        o.send("MOVE 2 2").await;
        assert_eq!(o.recv().await, "INVALID Cell already occupied");
        assert_eq!(o.recv().await, "YOURTURN");
        assert!(x.drain().await.is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_join_rejections() {
        let (_server, addr) = spawn_server(ServerConfig::default()).await;
        let mut stranger = TestClient::connect(addr).await;

        stranger.send("JOIN 42").await;
        assert_eq!(stranger.recv().await, "ERROR Game 42 not found");
        stranger.send("JOIN abc").await;
        assert_eq!(stranger.recv().await, "ERROR Invalid game ID");
        stranger.send("CREATE 20").await;
        assert_eq!(stranger.recv().await, "ERROR Number of players must be 2-13");

        let (mut x, _o) = started_game(addr).await;
        stranger.send("JOIN 1").await;
        assert_eq!(stranger.recv().await, "ERROR Game already started");
        x.send("CREATE 2").await;
        assert_eq!(x.recv().await, "ERROR Already in game 1");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_disconnect_aborts_active_game() {
        let (server, addr) = spawn_server(ServerConfig::default()).await;
        let (x, mut o) = started_game(addr).await;

        drop(x);
        assert_eq!(o.recv().await, "PLAYER_LEFT");
        assert_eq!(o.recv().await, "GAME_ABORTED");

        let sessions = server.get_session_registry();
        tokio::time::timeout(RECV_TIMEOUT, async {
            while sessions.get(1).await.is_some() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("aborted session should leave the registry");

        o.send("MOVE 0 0").await;
        assert_eq!(o.recv().await, "INVALID Not in a game");
        o.send("CREATE 2").await;
        assert_eq!(o.recv().await, "CREATED 2");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_three_player_game_survives_one_departure() {
        let (_server, addr) = spawn_server(ServerConfig::default()).await;
        let mut a = TestClient::connect(addr).await;
        let mut b = TestClient::connect(addr).await;
        let mut c = TestClient::connect(addr).await;

        a.send("CREATE 3").await;
        assert_eq!(a.recv().await, "CREATED 1");
        b.send("JOIN 1").await;
        assert_eq!(b.recv().await, "JOINED O");
        c.send("JOIN 1").await;
        assert_eq!(c.recv().await, "JOINED △");
        a.drain().await;
        b.drain().await;
        c.drain().await;

        a.send("MOVE 0 0").await;
        a.recv_board(4).await;
        b.recv_board(4).await;
        assert_eq!(b.recv().await, "YOURTURN");
        c.recv_board(4).await;

        b.send("EXIT").await;
        assert_eq!(b.recv().await, "BYE");
        b.expect_closed().await;

        assert_eq!(a.recv().await, "PLAYER_LEFT");
        assert_eq!(c.recv().await, "PLAYER_LEFT");
        assert_eq!(c.recv().await, "YOURTURN");

        c.send("MOVE 3 3").await;
        assert_eq!(c.recv_board(4).await[4], ". . . △");
        assert_eq!(a.recv_board(4).await[1], "X . . .");
        assert_eq!(a.recv().await, "YOURTURN");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_concurrent_moves_apply_once() {
        let (_server, addr) = spawn_server(ServerConfig::default()).await;
        let (mut x, mut o) = started_game(addr).await;

        tokio::join!(x.send("MOVE 1 1"), o.send("MOVE 1 1"));

        let x_lines = x.drain().await;
        let o_lines = o.drain().await;
        let boards = |lines: &[String]| lines.iter().filter(|l| *l == "BOARD").count();
        let invalids = |lines: &[String]| lines.iter().filter(|l| l.starts_with("INVALID")).count();

        assert_eq!(boards(&x_lines), 1);
        assert_eq!(invalids(&x_lines), 0);
        assert_eq!(boards(&o_lines), 1);
        assert_eq!(invalids(&o_lines), 1);
        assert!(x_lines.iter().any(|l| l == ". X ."));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_unknown_command_and_exit() {
        let (server, addr) = spawn_server(ServerConfig::default()).await;
        let mut client = TestClient::connect(addr).await;

        client.send("DANCE").await;
        assert_eq!(client.recv().await, "ERROR Unknown command: DANCE");
        client.send("CREATE").await;
        assert_eq!(client.recv().await, "ERROR Invalid CREATE command");
        client.send("MOVE 1").await;
        assert_eq!(client.recv().await, "INVALID Missing row or column");

        client.send("EXIT").await;
        assert_eq!(client.recv().await, "BYE");
        client.expect_closed().await;

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(server.get_connection_registry().connection_count(), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_connections_beyond_limit_are_refused() {
        let config = ServerConfig {
            max_connections: 1,
            ..Default::default()
        };
        let (server, addr) = spawn_server(config).await;

        let mut first = TestClient::connect(addr).await;
        first.send("LIST").await;
        assert_eq!(first.recv().await, "GAMES ");

        let mut second = TestClient::connect(addr).await;
        assert_eq!(second.recv().await, "ERROR Server full");
        second.expect_closed().await;
        assert_eq!(server.get_connection_registry().connection_count(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_overlong_line_drops_connection() {
        let config = ServerConfig {
            max_line_length: 16,
            ..Default::default()
        };
        let (_server, addr) = spawn_server(config).await;
        let mut client = TestClient::connect(addr).await;

        client.send(&"L".repeat(64)).await;
        client.expect_closed().await;
    }
}
