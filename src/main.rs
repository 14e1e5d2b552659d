use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use padi_diagnosis::config::Config;
use padi_diagnosis::orchestrator::{check_artifacts, App};
use padi_diagnosis::utils::logging;

const USAGE: &str = "用法:
  padi-diagnosis <图片路径> [答案1 答案2 答案3]
  padi-diagnosis diagnose

环境变量 PADI_CONFIG 可指定 TOML 配置文件";

/// 命令行参数
enum Command {
    Diagnose {
        image: PathBuf,
        answers: Option<[u32; 3]>,
    },
    CheckArtifacts,
}

fn parse_args(args: &[String]) -> Result<Command> {
    match args {
        [cmd] if cmd == "diagnose" => Ok(Command::CheckArtifacts),
        [image] => Ok(Command::Diagnose {
            image: PathBuf::from(image),
            answers: None,
        }),
        [image, a, b, c] => Ok(Command::Diagnose {
            image: PathBuf::from(image),
            answers: Some([a.parse()?, b.parse()?, c.parse()?]),
        }),
        _ => bail!("{}", USAGE),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = match std::env::var("PADI_CONFIG") {
        Ok(path) => Config::from_toml_file(Path::new(&path)).await?,
        Err(_) => Config::from_env(),
    };

    // 初始化日志
    logging::init(config.verbose_logging);

    let args: Vec<String> = std::env::args().skip(1).collect();
    match parse_args(&args)? {
        Command::CheckArtifacts => {
            if !check_artifacts(&config).await? {
                bail!("模型文件不完整，请检查 {}", config.model_base_url);
            }
        }
        Command::Diagnose { image, answers } => {
            let mut app = App::initialize(config).await?;
            app.run(&image, answers).await?;
        }
    }

    Ok(())
}
