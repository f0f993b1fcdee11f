#[actix_web::main]
async fn main() -> std::process::ExitCode {
    match pdf_scraper_lib::run().await {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", err);
            std::process::ExitCode::FAILURE
        }
    }
}
