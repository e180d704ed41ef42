//! 交互集成测试：AgentRuntime + HTTP 客户端 + 本地 FOI 服务桩

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use foi_agent::config::AppConfig;
    use foi_agent::core::{InteractionOutcome, InteractionPhase, RemoteError};
    use foi_agent::dialogue::UNREADABLE_VERDICT;
    use foi_agent::host::{MemoryHost, SlotId, SlotValue, VariableStore};
    use foi_agent::AgentRuntime;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn runtime(server: &MockServer) -> AgentRuntime {
        let mut cfg = AppConfig::default();
        cfg.server.base_url = server.uri();
        cfg.player.username = "ana".to_string();
        cfg.player.teacher = "prof".to_string();
        cfg.timeouts.request = 5;
        AgentRuntime::from_config(&cfg).unwrap()
    }

    fn success(response: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({ "status": "success", "response": response }))
    }

    /// 逐帧推进直到没有进行中的交互；输入框打开时提交 answer
    async fn drive(rt: &mut AgentRuntime, host: &mut MemoryHost, answer: Option<&str>) -> Vec<InteractionOutcome> {
        let mut outcomes = Vec::new();
        for _ in 0..2000 {
            if host.input().is_some() {
                if let Some(answer) = answer {
                    host.submit(answer);
                }
            }
            outcomes.extend(rt.tick(host));
            if rt.scheduler().active_count() == 0 {
                return outcomes;
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        panic!("interactions did not finish");
    }

    #[tokio::test]
    async fn test_query_displays_reply_and_resumes_caller() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/query/ana/Tutor"))
            .and(body_json(json!({ "prompt": "2+2?" })))
            .respond_with(success("4"))
            .expect(1)
            .mount(&server)
            .await;

        let mut rt = runtime(&server);
        let mut host = MemoryHost::new().with_auto_dismiss();
        let id = rt
            .dispatch(r#"foi_query_agent Tutor "2+2?""#, &mut host)
            .unwrap()
            .unwrap();
        assert!(rt.is_waiting(id));

        let outcomes = drive(&mut rt, &mut host, None).await;
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].id, id);
        assert_eq!(outcomes[0].phase, InteractionPhase::Done);
        assert!(!rt.is_waiting(id));
        assert_eq!(host.lines().last().map(String::as_str), Some("4"));
        assert_eq!(host.face(), Some(("Actor2", 2)));
    }

    #[tokio::test]
    async fn test_quiz_pass_sets_verdict_and_shows_feedback() {
        let server = MockServer::start().await;
        // 第一次 ask 出题，第二次判题
        Mock::given(method("POST"))
            .and(path("/query/ana/Tutor"))
            .respond_with(success("What is the capital of France?"))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/query/ana/Tutor"))
            .respond_with(success(r#"{"answer":"CORRECT","feedback":"Well done"}"#))
            .mount(&server)
            .await;

        let mut rt = runtime(&server);
        let mut host = MemoryHost::new().with_auto_dismiss();
        let id = rt
            .dispatch("foi_quiz_agent Tutor 10 11", &mut host)
            .unwrap()
            .unwrap();

        let outcomes = drive(&mut rt, &mut host, Some("Paris")).await;
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].phase, InteractionPhase::Done);
        assert!(outcomes[0].verdict.as_ref().is_some_and(|v| v.passed));
        assert_eq!(outcomes[0].question.as_deref(), Some("What is the capital of France?"));
        assert_eq!(outcomes[0].answer.as_deref(), Some("Paris"));
        assert!(!rt.is_waiting(id));

        assert_eq!(host.get(SlotId(10)), SlotValue::Text("Paris".to_string()));
        assert_eq!(host.get(SlotId(11)), SlotValue::Bool(true));
        assert!(host.lines().iter().any(|l| l == "What is the capital of France?"));
        assert_eq!(host.lines().last().map(String::as_str), Some("Well done"));

        // 判题请求带上了题目与作答
        let requests = server.received_requests().await.unwrap_or_default();
        assert_eq!(requests.len(), 2);
        let body = String::from_utf8_lossy(&requests[1].body);
        assert!(body.contains("What is the capital of France?"));
        assert!(body.contains("Paris"));
    }

    #[tokio::test]
    async fn test_quiz_unreadable_verdict_fails_closed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/query/ana/Tutor"))
            .respond_with(success("Name a prime number."))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/query/ana/Tutor"))
            .respond_with(success("oops"))
            .mount(&server)
            .await;

        let mut rt = runtime(&server);
        let mut host = MemoryHost::new().with_auto_dismiss();
        let id = rt
            .dispatch("foi_quiz_agent Tutor 1 2", &mut host)
            .unwrap()
            .unwrap();

        let outcomes = drive(&mut rt, &mut host, Some("7")).await;
        assert_eq!(outcomes[0].phase, InteractionPhase::Done);
        assert!(outcomes[0].verdict.as_ref().is_some_and(|v| !v.passed));
        assert!(!rt.is_waiting(id));
        assert_eq!(host.get(SlotId(2)), SlotValue::Bool(false));
        assert!(host.lines().join(" ").ends_with(UNREADABLE_VERDICT));
    }

    #[tokio::test]
    async fn test_create_duplicate_is_protocol_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/new/prof/ana/Tutor"))
            .and(body_json(json!({ "content": "You teach Rust" })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "status": "error", "message": "duplicate" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let mut rt = runtime(&server);
        let err = rt
            .create_agent("Tutor", None, "You teach Rust")
            .await
            .unwrap_err();
        assert_eq!(err, RemoteError::Protocol("duplicate".to_string()));
        assert_eq!(rt.scheduler().active_count(), 0);
    }

    #[tokio::test]
    async fn test_server_down_releases_caller() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/query/ana/Tutor"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let mut rt = runtime(&server);
        let mut host = MemoryHost::new().with_auto_dismiss();
        let id = rt
            .dispatch("foi_quiz_agent Tutor 1 2", &mut host)
            .unwrap()
            .unwrap();

        let outcomes = drive(&mut rt, &mut host, None).await;
        assert_eq!(outcomes[0].phase, InteractionPhase::Error);
        assert!(matches!(outcomes[0].error, Some(RemoteError::Network(_))));
        assert!(!rt.is_waiting(id));
        assert!(host.input().is_none());
    }
}
