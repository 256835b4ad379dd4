#[cfg(test)]
mod tests {
    use anyhow::Result;
    use serde_json::json;

    use crate::api::{ApiError, ListOptions};
    use crate::command::CommandRegistry;
    use crate::template::resolve_index;
    use crate::test_support::{FakeApi, host_with};

    fn abc() -> FakeApi {
        FakeApi::default().with_pods("ns", &["a", "b", "c"]).with_pods("other", &["z"])
    }

    #[test]
    fn test_resolve_index() {
        assert_eq!(resolve_index(0, 3), Some(0));
        assert_eq!(resolve_index(2, 3), Some(2));
        assert_eq!(resolve_index(3, 3), None);
        assert_eq!(resolve_index(-1, 3), Some(2));
        assert_eq!(resolve_index(-3, 3), Some(0));
        assert_eq!(resolve_index(-4, 3), None);
        assert_eq!(resolve_index(0, 0), None);
        assert_eq!(resolve_index(-1, 0), None);
    }

    #[test]
    fn test_fetch_uses_session_namespace() -> Result<()> {
        let (host, _out, api) = host_with(abc(), CommandRegistry::new());
        let count: i64 = host.eval("return Pods.new():fetch():count()")?;
        assert_eq!(count, 3);
        assert_eq!(api.calls.borrow()[0], ("Pod".to_string(), "ns".to_string(), ListOptions::default()));
        Ok(())
    }

    #[test]
    fn test_empty_namespace_lists_everything() -> Result<()> {
        let (host, _out, _api) = host_with(abc(), CommandRegistry::new());
        let count: i64 = host.eval("return Pods.new():fetch(''):count()")?;
        assert_eq!(count, 4);
        Ok(())
    }

    #[test]
    fn test_indexing_from_both_ends() -> Result<()> {
        let (host, _out, _api) = host_with(abc(), CommandRegistry::new());
        host.run("pods = Pods.new():fetch()")?;
        let last: String = host.eval("return pods[-1]:name()")?;
        assert_eq!(last, "c");
        let first: String = host.eval("return pods[0]:name()")?;
        assert_eq!(first, "a");
        let out_of_range: bool = host.eval("return pods[3] == nil and pods[-4] == nil")?;
        assert!(out_of_range);
        let mirrored: bool = host.eval(
            r#"
            local L = pods:count()
            for i = 0, L - 1 do
                if pods[i]:name() ~= pods[i - L]:name() then return false end
            end
            return true
            "#,
        )?;
        assert!(mirrored);
        Ok(())
    }

    #[test]
    fn test_non_integer_index_is_rejected() -> Result<()> {
        let (host, _out, _api) = host_with(abc(), CommandRegistry::new());
        let err = host.run("return Pods.new():fetch()[1.5]").unwrap_err();
        assert!(err.to_string().contains("index must be an integer"), "{err}");
        Ok(())
    }

    #[test]
    fn test_inspect_prints_one_line_per_item() -> Result<()> {
        let (host, out, _api) = host_with(abc(), CommandRegistry::new());
        host.run("Pods.new():fetch():inspect()")?;
        assert_eq!(out.lines(), vec!["0: ns/a", "1: ns/b", "2: ns/c"]);

        out.clear();
        host.run("Pods.new():fetch():last():inspect()")?;
        assert_eq!(out.lines(), vec!["ns/c"]);
        Ok(())
    }

    #[test]
    fn test_empty_collection_selects_nil() -> Result<()> {
        let (host, _out, _api) = host_with(FakeApi::default(), CommandRegistry::new());
        let all_nil: bool = host.eval(
            "local e = Pods.new(); return e:count() == 0 and e:first() == nil and e:last() == nil and e:any() == nil and e[0] == nil",
        )?;
        assert!(all_nil);
        Ok(())
    }

    #[test]
    fn test_first_last_any() -> Result<()> {
        let (host, _out, _api) = host_with(abc(), CommandRegistry::new());
        host.run("pods = Pods.new():fetch()")?;
        let ends: String = host.eval("return pods:first():name() .. pods:last():name()")?;
        assert_eq!(ends, "ac");
        for _ in 0..10 {
            let any: String = host.eval("return pods:any():name()")?;
            assert!(["a", "b", "c"].contains(&any.as_str()), "{any}");
        }
        Ok(())
    }

    #[test]
    fn test_each_yields_items_in_order() -> Result<()> {
        let (host, _out, _api) = host_with(abc(), CommandRegistry::new());
        let names: String = host.eval(
            "local names = {}; Pods.new():fetch():each(function(p) names[#names + 1] = p:name() end); return table.concat(names, ',')",
        )?;
        assert_eq!(names, "a,b,c");

        let err = host.run("Pods.new():each()").unwrap_err();
        assert!(err.to_string().contains("wrong number of arguments for `Pods#each`"), "{err}");
        Ok(())
    }

    #[test]
    fn test_name_filters() -> Result<()> {
        let (host, _out, api) = host_with(abc(), CommandRegistry::new());
        let by_pattern: i64 = host.eval("return Pods.new():fetch(nil, '^b'):count()")?;
        assert_eq!(by_pattern, 1);
        let by_table: i64 = host.eval("return Pods.new():fetch('ns', {name = '[ac]', labels = 'app=a'}):count()")?;
        assert_eq!(by_table, 2);
        assert_eq!(api.calls.borrow()[1].2, ListOptions::with_labels("app=a"));

        let err = host.run("Pods.new():fetch(nil, '(')").unwrap_err();
        assert!(err.to_string().contains("invalid name pattern"), "{err}");
        let err = host.run("Pods.new():fetch(nil, {color = 'red'})").unwrap_err();
        assert!(err.to_string().contains("only accepts `labels`, `name` as keys, got `color`"), "{err}");
        let err = host.run("Pods.new():fetch(nil, 7)").unwrap_err();
        assert!(err.to_string().contains("filter must be a string or a table"), "{err}");
        Ok(())
    }

    #[test]
    fn test_fetch_replaces_items_and_update_replays() -> Result<()> {
        let (host, _out, api) = host_with(abc(), CommandRegistry::new());
        host.run("pods = Pods.new():fetch('other')")?;
        let names: String = host.eval("return pods:first():name()")?;
        assert_eq!(names, "z");
        host.run("pods:fetch()")?;
        let count: i64 = host.eval("return pods:count()")?;
        assert_eq!(count, 3);
        host.run("pods:update()")?;

        let calls = api.calls.borrow();
        let namespaces: Vec<&str> = calls.iter().map(|(_, ns, _)| ns.as_str()).collect();
        assert_eq!(namespaces, vec!["other", "ns", "ns"]);
        Ok(())
    }

    #[test]
    fn test_item_accessors() -> Result<()> {
        let (host, _out, _api) = host_with(abc(), CommandRegistry::new());
        host.run("pod = Pods.new():fetch()[1]")?;
        let summary: String = host.eval(
            "return table.concat({pod:name(), pod:namespace(), pod:phase(), pod:node(), pod:ip(), pod:labels().app, pod:images()[1]}, ' ')",
        )?;
        assert_eq!(summary, "b ns Running node-1 10.0.0.1 b registry.local/b:1.0");
        let raw_name: String = host.eval("return pod:to_h().metadata.name")?;
        assert_eq!(raw_name, "b");
        Ok(())
    }

    #[test]
    fn test_other_kinds() -> Result<()> {
        let api = FakeApi::default()
            .with(
                "Service",
                json!({
                    "metadata": { "name": "web", "namespace": "ns" },
                    "spec": { "type": "ClusterIP", "clusterIP": "10.96.0.1", "ports": [{ "port": 80 }, { "port": 443 }] }
                }),
            )
            .with(
                "Deployment",
                json!({
                    "metadata": { "name": "api", "namespace": "ns" },
                    "spec": { "replicas": 3, "template": { "spec": { "containers": [{ "name": "api", "image": "api:2" }] } } },
                    "status": { "replicas": 3 }
                }),
            );
        let (host, _out, _api) = host_with(api, CommandRegistry::new());
        let service: String = host.eval(
            "local s = Services.new():fetch():first(); return s:type() .. ' ' .. s:cluster_ip() .. ' ' .. table.concat(s:ports(), ',')",
        )?;
        assert_eq!(service, "ClusterIP 10.96.0.1 80,443");
        let deployment: String = host.eval(
            "local d = Deployments.new():fetch():first(); return d:replicas() .. '/' .. d:ready_replicas() .. ' ' .. d:images()[1]",
        )?;
        assert_eq!(deployment, "3/0 api:2");
        Ok(())
    }

    #[test]
    fn test_api_errors_surface_in_script() -> Result<()> {
        let api = FakeApi {
            fail_with: Some(ApiError::Unauthorized("token expired".to_string())),
            ..FakeApi::default()
        };
        let (host, _out, _api) = host_with(api, CommandRegistry::new());
        let err = host.run("Pods.new():fetch()").unwrap_err();
        assert!(err.to_string().contains("unauthorized: token expired"), "{err}");
        Ok(())
    }

    #[test]
    fn test_methods_reject_foreign_instances() -> Result<()> {
        let (host, _out, _api) = host_with(abc(), CommandRegistry::new());
        let err = host.run("Pods.new().count(Services.new())").unwrap_err();
        assert!(err.to_string().contains("Pods: could not find class instance"), "{err}");
        Ok(())
    }

    #[test]
    fn test_every_access_creates_a_new_item_handle() -> Result<()> {
        let (host, _out, _api) = host_with(abc(), CommandRegistry::new());
        let distinct: bool = host.eval("local p = Pods.new():fetch(); return p[0] ~= p[0]")?;
        assert!(distinct);
        let count: i64 = host.eval("return Pod.object_count()")?;
        assert_eq!(count, 2);
        Ok(())
    }
}
