use kube::CustomResourceExt;

use kogito_common::telemetry::get_logger;
use kogito_operator::app::KogitoApp;

fn main() {
    get_logger("crdgen").info("generating KogitoApp custom resource definition");
    print!("{}", serde_yaml::to_string(&KogitoApp::crd()).unwrap());
}
