//! Cloud-config payload for Kubernetes master instances
//!
//! The payload is passed through `Fn::Sub`, so `${Name}` is a template
//! reference resolved by CloudFormation while `$private_ipv4` is left for
//! CoreOS to substitute at boot.

/// Kubernetes release shipped in the static pod manifests
pub const HYPERKUBE_IMAGE: &str = "quay.io/coreos/hyperkube:v1.2.2_coreos.0";

const COREOS_UNITS: &str = r#"coreos:
  update:
    reboot-strategy: off
  etcd2:
    advertise-client-urls: http://$private_ipv4:2379
    initial-advertise-peer-urls: http://$private_ipv4:2380
    listen-client-urls: http://0.0.0.0:2379
    listen-peer-urls: http://$private_ipv4:2380
  units:
    - name: update-engine.service
      command: stop
    - name: locksmithd.service
      command: stop
    - name: format-ephemeral.service
      command: start
      content: |
        [Unit]
        Description=Formats the ephemeral drive
        After=dev-xvdb.device
        Requires=dev-xvdb.device
        [Service]
        Type=oneshot
        RemainAfterExit=yes
        ExecStart=/usr/sbin/wipefs -f /dev/xvdb
        ExecStart=/usr/sbin/mkfs.ext4 -F /dev/xvdb
    - name: var-lib-docker.mount
      command: start
      content: |
        [Unit]
        Description=Mount ephemeral to /var/lib/docker
        Requires=format-ephemeral.service
        After=format-ephemeral.service
        [Mount]
        What=/dev/xvdb
        Where=/var/lib/docker
        Type=ext4
    - name: docker.service
      drop-ins:
        - name: 10-wait-docker.conf
          content: |
            [Unit]
            After=var-lib-docker.mount
            Requires=var-lib-docker.mount
    - name: etcd-peers.service
      command: start
      content: |
        [Unit]
        Description=Write a file with the etcd peers that we should bootstrap to
        After=docker.service
        Requires=docker.service

        [Service]
        Type=oneshot
        RemainAfterExit=yes
        ExecStart=/usr/bin/docker pull monsantoco/etcd-aws-cluster:latest
        ExecStart=/usr/bin/docker run --rm=true -v /etc/sysconfig/:/etc/sysconfig/ monsantoco/etcd-aws-cluster:latest
    - name: etcd2.service
      command: start
      drop-ins:
        - name: 30-etcd_peers.conf
          content: |
            [Unit]
            After=etcd-peers.service
            Requires=etcd-peers.service

            [Service]
            # Load the other hosts in the etcd leader autoscaling group from file
            EnvironmentFile=/etc/sysconfig/etcd-peers
    - name: fleet.service
      command: start
    - name: flanneld.service
      drop-ins:
        - name: 50-network-config.conf
          content: |
            [Service]
            ExecStartPre=/usr/bin/etcdctl set /coreos.com/network/config '{ "Network": "${FlannelNetwork}", "SubnetLen": ${FlannelSubnetLen}, "SubnetMin": "${FlannelSubnetMin}", "SubnetMax": "${FlannelSubnetMax}" }'
      command: start
    - name: kubelet.service
      command: start
      drop-ins:
        - name: local.conf
          content: |
            [Service]
            Environment="RKT_OPTS=--volume=resolv,kind=host,source=/etc/resolv.conf --mount volume=resolv,target=/etc/resolv.conf"
            Environment=KUBELET_VERSION=v1.2.2_coreos.0
            ExecStartPre=/usr/bin/mkdir -p /etc/kubernetes/manifests

            ExecStart=
            ExecStart=/usr/lib/coreos/kubelet-wrapper \
              --api-servers=http://127.0.0.1:8080 \
              --allow-privileged=true \
              --cloud-provider=aws \
              --config=/etc/kubernetes/manifests
            Restart=always
            RestartSec=10
    - name: kube-system.service
      command: start
      content: |
        [Unit]
        After=kubelet.service
        Requires=kubelet.service

        [Service]
        Type=oneshot
        ExecStart=/bin/sh -c 'while true; do curl -H "Content-Type: application/json" -XPOST -d\'{"apiVersion":"v1","kind":"Namespace","metadata":{"name":"kube-system"}}\' -sS "http://127.0.0.1:8080/api/v1/namespaces" && break || sleep 20; done'
"#;

const KUBE_APISERVER: &str = r#"apiVersion: v1
kind: Pod
metadata:
  name: kube-apiserver
  namespace: kube-system
spec:
  hostNetwork: true
  containers:
  - name: kube-apiserver
    image: {image}
    command:
    - /hyperkube
    - apiserver
    - --etcd-servers=http://127.0.0.1:2379
    - --allow-privileged=true
    - --service-cluster-ip-range=10.3.0.0/24
    - --secure-port=443
    - --admission-control=NamespaceLifecycle,LimitRanger,SecurityContextDeny,ResourceQuota
    - --runtime-config=extensions/v1beta1/deployments=true,extensions/v1beta1/daemonsets=true
    - --external-hostname=${APIServerLoadBalancer.DNSName}
    - --basic-auth-file=/srv/kubernetes/basic_auth.csv
    - --cloud-provider=aws
    ports:
    - containerPort: 443
      hostPort: 443
      name: https
    - containerPort: 8080
      hostPort: 8080
      name: local
    volumeMounts:
    - mountPath: /etc/ssl/certs
      name: ssl-certs-host
      readOnly: true
    - mountPath: /srv/kubernetes/basic_auth.csv
      name: basic-auth-file
      readOnly: true
  volumes:
  - hostPath:
      path: /usr/share/ca-certificates
    name: ssl-certs-host
  - hostPath:
      path: /srv/kubernetes/basic_auth.csv
    name: basic-auth-file
"#;

const KUBE_PROXY: &str = r#"apiVersion: v1
kind: Pod
metadata:
  name: kube-proxy
  namespace: kube-system
spec:
  hostNetwork: true
  containers:
  - name: kube-proxy
    image: {image}
    command:
    - /hyperkube
    - proxy
    - --master=http://127.0.0.1:8080
    - --proxy-mode=iptables
    securityContext:
      privileged: true
    volumeMounts:
    - mountPath: /etc/ssl/certs
      name: ssl-certs-host
      readOnly: true
  volumes:
  - hostPath:
      path: /usr/share/ca-certificates
    name: ssl-certs-host
"#;

const KUBE_CONTROLLER_MANAGER: &str = r#"apiVersion: v1
kind: Pod
metadata:
  name: kube-controller-manager
  namespace: kube-system
spec:
  hostNetwork: true
  containers:
  - name: kube-controller-manager
    image: {image}
    command:
    - /hyperkube
    - controller-manager
    - --master=http://127.0.0.1:8080
    - --leader-elect=true
    - --service-sync-period=10m
    - --node-sync-period=5m
    - --cloud-provider=aws
    livenessProbe:
      httpGet:
        host: 127.0.0.1
        path: /healthz
        port: 10252
      initialDelaySeconds: 15
      timeoutSeconds: 1
    volumeMounts:
    - mountPath: /etc/ssl/certs
      name: ssl-certs-host
      readOnly: true
  volumes:
  - hostPath:
      path: /usr/share/ca-certificates
    name: ssl-certs-host
"#;

const KUBE_SCHEDULER: &str = r#"apiVersion: v1
kind: Pod
metadata:
  name: kube-scheduler
  namespace: kube-system
spec:
  hostNetwork: true
  containers:
  - name: kube-scheduler
    image: {image}
    command:
    - /hyperkube
    - scheduler
    - --master=http://127.0.0.1:8080
    - --leader-elect=true
    livenessProbe:
      httpGet:
        host: 127.0.0.1
        path: /healthz
        port: 10251
      initialDelaySeconds: 15
      timeoutSeconds: 1
"#;

const BASIC_AUTH_CSV: &str = "${Password},${Username},admin\n";

const KUBE2CONSUL: &str = r#"apiVersion: v1
kind: Pod
metadata:
  name: kube2consul
  namespace: kube-system
spec:
  hostNetwork: true
  containers:
  - name: consul-agent
    image: gliderlabs/consul-agent:0.6
    args:
    - -advertise=$private_ipv4
    - -dc=${ConsulDC}
    - -join=${ConsulJoin}
    ports:
    - hostPort: 8301
      containerPort: 8301
      protocol: TCP
      hostIP: $private_ipv4
    - hostPort: 8301
      containerPort: 8301
      protocol: UDP
      hostIP: $private_ipv4
    - hostPort: 8500
      containerPort: 8500
      protocol: TCP
      hostIP: $private_ipv4
  - name: kube2consul
    image: jmccarty3/kube2consul:latest
    command:
    - /kube2consul
    - -consul-agent=http://127.0.0.1:8500
    - -kube_master_url=http://127.0.0.1:8080
"#;

/// Files written by cloud-init, in write order
pub fn static_files() -> Vec<(&'static str, String)> {
    let with_image = |manifest: &str| manifest.replace("{image}", HYPERKUBE_IMAGE);

    vec![
        (
            "/etc/kubernetes/manifests/kube-apiserver.yaml",
            with_image(KUBE_APISERVER),
        ),
        ("/etc/kubernetes/manifests/kube-proxy.yaml", with_image(KUBE_PROXY)),
        (
            "/etc/kubernetes/manifests/kube-controller-manager.yaml",
            with_image(KUBE_CONTROLLER_MANAGER),
        ),
        (
            "/etc/kubernetes/manifests/kube-scheduler.yaml",
            with_image(KUBE_SCHEDULER),
        ),
        ("/srv/kubernetes/basic_auth.csv", BASIC_AUTH_CSV.to_string()),
        (
            "/etc/kubernetes/manifests/kube2consul.yaml",
            KUBE2CONSUL.to_string(),
        ),
    ]
}

/// Render the complete `#cloud-config` document
pub fn cloud_config() -> String {
    let mut doc = String::from("#cloud-config\n\n");
    doc.push_str(COREOS_UNITS);
    doc.push_str("write_files:\n");

    for (path, content) in static_files() {
        doc.push_str(&format!("  - path: {}\n    content: |\n", path));
        for line in content.lines() {
            if line.is_empty() {
                doc.push('\n');
            } else {
                doc.push_str("      ");
                doc.push_str(line);
                doc.push('\n');
            }
        }
    }

    doc
}
