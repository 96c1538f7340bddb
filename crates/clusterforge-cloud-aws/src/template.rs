//! Kubernetes master stack template
//!
//! Builds the CloudFormation document once. The document is static: every
//! per-cluster value enters through stack parameters at creation time.

use crate::error::Result;
use crate::user_data;
use clusterforge_cloud::keys::{outputs, params};
use serde_json::{Map, Value, json};

/// CoreOS 991.2.0 AMIs
const REGION_AMIS: &[(&str, &str)] = &[
    ("eu-central-1", "ami-e83ddb87"),
    ("ap-northeast-1", "ami-67e9fd09"),
    ("sa-east-1", "ami-9666eafa"),
    ("ap-southeast-2", "ami-9a7d5ef9"),
    ("ap-southeast-1", "ami-b8d319db"),
    ("us-east-1", "ami-cfaba5a5"),
    ("us-west-2", "ami-141df674"),
    ("us-west-1", "ami-6c037e0c"),
    ("eu-west-1", "ami-d149cea2"),
];

const INSTANCE_TYPES: &[&str] = &[
    "m4.large",
    "m4.xlarge",
    "m4.2xlarge",
    "m4.4xlarge",
    "m4.10xlarge",
];

fn reference(name: &str) -> Value {
    json!({ "Ref": name })
}

fn open_rule(protocol: &str, from: &str, to: &str) -> Value {
    json!({
        "IpProtocol": protocol,
        "FromPort": from,
        "ToPort": to,
        "CidrIp": "0.0.0.0/0",
    })
}

fn self_ingress(protocol: &str, port: &str) -> Value {
    json!({
        "Type": "AWS::EC2::SecurityGroupIngress",
        "Properties": {
            "IpProtocol": protocol,
            "FromPort": port,
            "ToPort": port,
            "SourceSecurityGroupId": reference("SecurityGroup"),
            "GroupId": reference("SecurityGroup"),
        }
    })
}

fn security_group(description: &str, ingress: Vec<Value>) -> Value {
    json!({
        "Type": "AWS::EC2::SecurityGroup",
        "Properties": {
            "GroupDescription": description,
            "SecurityGroupIngress": ingress,
            "VpcId": reference(params::VPC),
        }
    })
}

fn internal_load_balancer(port: &str, protocol: &str, security_group: &str) -> Value {
    json!({
        "Type": "AWS::ElasticLoadBalancing::LoadBalancer",
        "Properties": {
            "HealthCheck": {
                "Target": format!("TCP:{}", port),
                "HealthyThreshold": "3",
                "UnhealthyThreshold": "5",
                "Interval": "30",
                "Timeout": "5",
            },
            "Listeners": [{
                "LoadBalancerPort": port,
                "InstancePort": port,
                "Protocol": protocol,
            }],
            "Scheme": "internal",
            "SecurityGroups": [reference(security_group)],
            "Subnets": [reference(params::SUBNET)],
        }
    })
}

fn parameters() -> Value {
    json!({
        (params::VPC): { "Type": "AWS::EC2::VPC::Id" },
        (params::SUBNET): { "Type": "AWS::EC2::Subnet::Id" },
        "FlannelNetwork": { "Type": "String", "Default": "10.1.0.0/16" },
        "FlannelSubnetLen": { "Type": "Number", "Default": "24" },
        "FlannelSubnetMin": { "Type": "String", "Default": "10.1.0.0" },
        "FlannelSubnetMax": { "Type": "String", "Default": "10.1.24.0" },
        (params::CLUSTER_NAME): { "Type": "String", "Default": "kubernetes" },
        (params::USERNAME): { "Type": "String", "Default": "admin" },
        (params::PASSWORD): { "Type": "String", "Default": "admin" },
        (params::CONSUL_DC): { "Type": "String", "Default": "dc1" },
        (params::CONSUL_JOIN): { "Type": "String" },
        "DockerGraphSize": { "Type": "Number", "Default": "120" },
        "InstanceType": {
            "Type": "String",
            "Default": INSTANCE_TYPES[0],
            "AllowedValues": INSTANCE_TYPES,
        },
        (params::KEY_NAME): { "Type": "AWS::EC2::KeyPair::KeyName" },
    })
}

fn iam_resources(resources: &mut Map<String, Value>) {
    resources.insert(
        "Role".into(),
        json!({
            "Type": "AWS::IAM::Role",
            "Properties": {
                "AssumeRolePolicyDocument": {
                    "Statement": [{
                        "Effect": "Allow",
                        "Action": ["sts:AssumeRole"],
                        "Principal": { "Service": ["ec2.amazonaws.com"] },
                    }]
                }
            }
        }),
    );

    resources.insert(
        "Policy".into(),
        json!({
            "Type": "AWS::IAM::Policy",
            "Properties": {
                "PolicyName": "coreos",
                "PolicyDocument": {
                    "Statement": [
                        {
                            "Effect": "Allow",
                            "Action": [
                                "ec2:Describe*",
                                "ec2:CreateTags",
                                "ec2:AttachVolume",
                                "ec2:CreateVolume",
                                "ec2:DeleteVolume",
                                "ec2:DetachVolume",
                                "ec2:SecurityGroup",
                            ],
                            "Resource": ["*"],
                        },
                        {
                            "Effect": "Allow",
                            "Action": [
                                "autoscaling:Describe*",
                                "elasticloadbalancing:Describe*",
                            ],
                            "Resource": ["*"],
                        }
                    ]
                },
                "Roles": [reference("Role")],
            }
        }),
    );

    resources.insert(
        "InstanceProfile".into(),
        json!({
            "Type": "AWS::IAM::InstanceProfile",
            "Properties": { "Roles": [reference("Role")] }
        }),
    );
}

fn network_resources(resources: &mut Map<String, Value>) {
    resources.insert(
        "SecurityGroup".into(),
        json!({
            "Type": "AWS::EC2::SecurityGroup",
            "Properties": {
                "GroupDescription": "Kubernetes Security Group",
                "SecurityGroupIngress": [
                    open_rule("tcp", "22", "22"),
                    open_rule("tcp", "8301", "8301"),
                    open_rule("udp", "8301", "8301"),
                    open_rule("tcp", "30000", "32767"),
                ],
                "SecurityGroupEgress": [open_rule("-1", "-1", "-1")],
                "VpcId": reference(params::VPC),
            }
        }),
    );

    resources.insert(
        "etcdClientCommunicationSecurityGroupIngress".into(),
        self_ingress("tcp", "2379"),
    );
    resources.insert(
        "etcdServerToServerCommunicationSecurityGroupIngress".into(),
        self_ingress("tcp", "2380"),
    );
    resources.insert(
        "flannelVXLANSecurityGroupIngress".into(),
        self_ingress("udp", "8472"),
    );

    resources.insert(
        "ServerSecurityGroup".into(),
        security_group(
            "Kubernetes API Server Security Group",
            vec![open_rule("tcp", "443", "443")],
        ),
    );
    resources.insert(
        "APIServerLoadBalancer".into(),
        internal_load_balancer("443", "TCP", "ServerSecurityGroup"),
    );

    resources.insert(
        "ConsulHTTPAPISecurityGroup".into(),
        security_group(
            "Consul HTTP API Security Group",
            vec![open_rule("tcp", "8500", "8500")],
        ),
    );
    resources.insert(
        "ConsulHTTPAPILoadBalancer".into(),
        internal_load_balancer("8500", "HTTP", "ConsulHTTPAPISecurityGroup"),
    );
}

fn compute_resources(resources: &mut Map<String, Value>) {
    resources.insert(
        "LaunchConfiguration".into(),
        json!({
            "Type": "AWS::AutoScaling::LaunchConfiguration",
            "Properties": {
                "BlockDeviceMappings": [{
                    "DeviceName": "/dev/sdb",
                    "Ebs": { "VolumeSize": reference("DockerGraphSize") },
                }],
                "IamInstanceProfile": reference("InstanceProfile"),
                "ImageId": { "Fn::FindInMap": ["RegionMap", reference("AWS::Region"), "AMI"] },
                "InstanceType": reference("InstanceType"),
                "KeyName": reference(params::KEY_NAME),
                "SecurityGroups": [
                    reference("SecurityGroup"),
                    reference("ServerSecurityGroup"),
                    reference("ConsulHTTPAPISecurityGroup"),
                ],
                "UserData": { "Fn::Base64": { "Fn::Sub": user_data::cloud_config() } },
            }
        }),
    );

    resources.insert(
        "AutoScalingGroup".into(),
        json!({
            "Type": "AWS::AutoScaling::AutoScalingGroup",
            "Properties": {
                "DesiredCapacity": "1",
                "Tags": [{ "Key": "Name", "Value": "Kubernetes Master", "PropagateAtLaunch": true }],
                "LaunchConfigurationName": reference("LaunchConfiguration"),
                "LoadBalancerNames": [
                    reference("APIServerLoadBalancer"),
                    reference("ConsulHTTPAPILoadBalancer"),
                ],
                "MinSize": "1",
                "MaxSize": "3",
                "VPCZoneIdentifier": [reference(params::SUBNET)],
            },
            "UpdatePolicy": {
                "AutoScalingRollingUpdate": {
                    "MinInstancesInService": "1",
                    "MaxBatchSize": "1",
                }
            }
        }),
    );
}

/// Build the template document
pub fn build() -> Value {
    let region_map: Map<String, Value> = REGION_AMIS
        .iter()
        .map(|(region, ami)| (region.to_string(), json!({ "AMI": ami })))
        .collect();

    let mut resources = Map::new();
    iam_resources(&mut resources);
    network_resources(&mut resources);
    compute_resources(&mut resources);

    json!({
        "AWSTemplateFormatVersion": "2010-09-09",
        "Mappings": { "RegionMap": region_map },
        "Parameters": parameters(),
        "Resources": resources,
        "Outputs": {
            (outputs::API_SERVER): {
                "Value": { "Fn::Join": ["", [
                    "https://",
                    { "Fn::GetAtt": ["APIServerLoadBalancer", "DNSName"] },
                ]] }
            },
            (outputs::CONSUL_HTTP_API): {
                "Value": { "Fn::Join": ["", [
                    "http://",
                    { "Fn::GetAtt": ["ConsulHTTPAPILoadBalancer", "DNSName"] },
                    ":8500",
                ]] }
            },
        }
    })
}

/// Template body as submitted to CloudFormation
pub fn body() -> Result<String> {
    Ok(serde_json::to_string(&build())?)
}
