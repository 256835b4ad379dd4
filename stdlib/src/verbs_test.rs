#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use anyhow::Result;
    use rk_core::{Capture, Host, HostConfig};

    use crate::cluster::ManifestCluster;
    use crate::stdlib_commands;

    const MANIFEST: &str = r#"
kind: PodList
items:
  - metadata: { name: web-1, namespace: shop, labels: { app: web } }
    spec: { containers: [ { name: web, image: "nginx:1.25" } ] }
    status: { phase: Running }
  - metadata: { name: web-2, namespace: shop, labels: { app: web } }
    status: { phase: Pending }
  - metadata: { name: coredns, namespace: kube-system }
---
kind: Service
metadata: { name: web, namespace: shop }
spec: { type: NodePort, ports: [ { port: 80 } ] }
---
kind: Deployment
metadata: { name: web, namespace: shop }
spec: { replicas: 2 }
status: { readyReplicas: 1 }
"#;

    struct Fixture {
        host: Host,
        out: Capture,
        verbs: Rc<RefCell<Vec<String>>>,
    }

    fn fixture(namespace: &str) -> Result<Fixture> {
        let out = Capture::new();
        let verbs = Rc::new(RefCell::new(Vec::new()));
        let seen = verbs.clone();
        let config = HostConfig::new(Rc::new(ManifestCluster::from_yaml_str(MANIFEST)?))
            .namespace(namespace)
            .output(out.clone())
            .observer(move |line| seen.borrow_mut().push(line.to_string()));
        let host = Host::initialize(config, stdlib_commands()?, &[])?;
        Ok(Fixture { host, out, verbs })
    }

    #[test]
    fn test_count_pods_spans_namespaces() -> Result<()> {
        let f = fixture("shop")?;
        let n: i64 = f.host.eval("return count_pods()")?;
        assert_eq!(n, 3);
        assert_eq!(f.out.lines(), vec!["There are 3 pods in the cluster"]);
        assert_eq!(*f.verbs.borrow(), vec!["count_pods()".to_string()]);
        Ok(())
    }

    #[test]
    fn test_pods_verb_fetches() -> Result<()> {
        let f = fixture("shop")?;
        let n: i64 = f.host.eval("return pods():count()")?;
        assert_eq!(n, 2);
        let n: i64 = f.host.eval("return pods('kube-system'):count()")?;
        assert_eq!(n, 1);
        let phase: String = f.host.eval("return pods(nil, '2$'):first():phase()")?;
        assert_eq!(phase, "Pending");
        let n: i64 = f.host.eval("return pods('', {labels = 'app=web'}):count()")?;
        assert_eq!(n, 2);
        assert_eq!(
            f.verbs.borrow()[3],
            "pods(, {labels = \"app=web\"})".to_string()
        );
        Ok(())
    }

    #[test]
    fn test_services_and_deployments() -> Result<()> {
        let f = fixture("shop")?;
        let kind: String = f.host.eval("return services():first():type()")?;
        assert_eq!(kind, "NodePort");
        let ready: String = f.host.eval(
            "local d = deployments():first(); return d:ready_replicas() .. '/' .. d:replicas()",
        )?;
        assert_eq!(ready, "1/2");
        Ok(())
    }

    #[test]
    fn test_new_app_builds_unsaved_pod() -> Result<()> {
        let f = fixture("staging")?;
        let described: String = f.host.eval(
            "local app = new_app({image = 'registry.local/team/shop:v3'}); return app:namespace() .. '/' .. app:name() .. ' ' .. app:images()[1]",
        )?;
        assert_eq!(described, "staging/shop registry.local/team/shop:v3");
        assert_eq!(f.verbs.borrow()[0], "new_app({image = \"registry.local/team/shop:v3\"})");

        let n: i64 = f.host.eval("return count_pods()")?;
        assert_eq!(n, 3);
        Ok(())
    }

    #[test]
    fn test_new_app_validates_before_building() -> Result<()> {
        let f = fixture("shop")?;
        let err = f.host.run("new_app({image = 'x', bogus = 'y'})").unwrap_err();
        assert!(
            err.to_string().contains("new_app only accepts `image`, `name` as keys, got `bogus`"),
            "{err}"
        );
        assert_eq!(f.verbs.borrow().len(), 1);
        let count: i64 = f.host.eval("return Pod.object_count()")?;
        assert_eq!(count, 0);
        Ok(())
    }
}
