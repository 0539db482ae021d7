mod common;

use actix_web::{http::StatusCode, test};
use pretty_assertions::assert_eq;
use taskgate::build_app;
use taskgate::models::{Task, TaskInput, TaskStatus};
use taskgate::store::{TaskStore, UserStore};

use common::{Browser, TestContext, PASSWORD};

#[test_log::test(actix_rt::test)]
async fn test_admin_user_lifecycle() {
    let ctx = TestContext::new();
    ctx.create_user("admin", "admin@example.com", true).await;
    let app = test::init_service(build_app(ctx.state.clone(), ctx.settings.clone())).await;
    let mut browser = Browser::new();
    browser.login(&app, "admin@example.com", PASSWORD).await;

    // Create
    let page = browser
        .submit(
            &app,
            "/admin/users/new",
            "/admin/users/new",
            &[
                ("name", "111"),
                ("email", "111@example.com"),
                ("password", "000000"),
                ("password_confirmation", "000000"),
            ],
        )
        .await;
    assert_eq!(page.status, StatusCode::SEE_OTHER);
    let created = ctx
        .store
        .find_user_by_email("111@example.com")
        .await
        .unwrap()
        .expect("user was created");
    assert!(!created.admin);
    assert_eq!(page.location(), format!("/admin/users/{}", created.id));

    // Show
    let page = browser.follow(&app, &page).await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("User created!"));
    assert!(page.body.contains("111@example.com"));

    // Edit, keeping the password
    let edit_path = format!("/admin/users/{}/edit", created.id);
    let page = browser
        .submit(
            &app,
            &edit_path,
            &edit_path,
            &[
                ("name", "sample2"),
                ("email", "sample2@example.com"),
                ("password", ""),
                ("password_confirmation", ""),
                ("admin", "1"),
            ],
        )
        .await;
    assert_eq!(page.location(), format!("/admin/users/{}", created.id));
    let page = browser.follow(&app, &page).await;
    assert!(page.body.contains("User updated!"));
    assert!(page.body.contains("sample2"));

    let updated = ctx.store.find_user(created.id).await.unwrap().unwrap();
    assert_eq!(updated.email, "sample2@example.com");
    assert!(updated.admin);
    assert_eq!(updated.password_hash, created.password_hash);

    // Delete
    let page = browser
        .delete(&app, "/admin/users", &format!("/admin/users/{}", created.id))
        .await;
    assert_eq!(page.location(), "/admin/users");
    let page = browser.follow(&app, &page).await;
    assert!(page.body.contains("User deleted!"));
    assert!(!page.body.contains("sample2@example.com"));
    assert!(ctx.store.find_user(created.id).await.unwrap().is_none());
}

#[test_log::test(actix_rt::test)]
async fn test_admin_create_can_grant_admin_and_validates() {
    let ctx = TestContext::new();
    ctx.create_user("admin", "admin@example.com", true).await;
    let app = test::init_service(build_app(ctx.state.clone(), ctx.settings.clone())).await;
    let mut browser = Browser::new();
    browser.login(&app, "admin@example.com", PASSWORD).await;

    let page = browser
        .submit(
            &app,
            "/admin/users/new",
            "/admin/users/new",
            &[
                ("name", ""),
                ("email", "admin@example.com"),
                ("password", "1"),
                ("password_confirmation", "1"),
            ],
        )
        .await;
    assert_eq!(page.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(page.body.contains("Email has already been taken"));
    assert!(page.body.contains("Password is too short (minimum is 6 characters)"));

    let page = browser
        .submit(
            &app,
            "/admin/users/new",
            "/admin/users/new",
            &[
                ("name", "second"),
                ("email", "second@example.com"),
                ("password", "000000"),
                ("password_confirmation", "000000"),
                ("admin", "1"),
            ],
        )
        .await;
    assert_eq!(page.status, StatusCode::SEE_OTHER);
    let second = ctx
        .store
        .find_user_by_email("second@example.com")
        .await
        .unwrap()
        .unwrap();
    assert!(second.admin);
}

#[test_log::test(actix_rt::test)]
async fn test_admin_cannot_delete_or_demote_self() {
    let ctx = TestContext::new();
    let admin = ctx.create_user("admin", "admin@example.com", true).await;
    let app = test::init_service(build_app(ctx.state.clone(), ctx.settings.clone())).await;
    let mut browser = Browser::new();
    browser.login(&app, "admin@example.com", PASSWORD).await;

    let page = browser
        .delete(&app, "/admin/users", &format!("/admin/users/{}", admin.id))
        .await;
    assert_eq!(page.location(), "/admin/users");
    let page = browser.follow(&app, &page).await;
    assert!(page.body.contains("You cannot delete your own account!"));
    assert!(ctx.store.find_user(admin.id).await.unwrap().is_some());

    let edit_path = format!("/admin/users/{}/edit", admin.id);
    let page = browser
        .submit(
            &app,
            &edit_path,
            &edit_path,
            &[("name", "root"), ("email", "admin@example.com")],
        )
        .await;
    assert_eq!(page.status, StatusCode::SEE_OTHER);
    let reloaded = ctx.store.find_user(admin.id).await.unwrap().unwrap();
    assert_eq!(reloaded.name, "root");
    assert!(reloaded.admin);
}

#[test_log::test(actix_rt::test)]
async fn test_admin_pages_show_task_counts_and_tasks() {
    let ctx = TestContext::new();
    ctx.create_user("admin", "admin@example.com", true).await;
    let owner = ctx.create_user("owner", "owner@example.com", false).await;
    for title in ["Write report", "Review budget"] {
        ctx.store
            .create_task(Task::new(
                TaskInput {
                    title: title.to_string(),
                    description: None,
                    priority: None,
                    due_date: None,
                    status: TaskStatus::Todo,
                },
                owner.id,
            ))
            .await
            .unwrap();
    }
    let app = test::init_service(build_app(ctx.state.clone(), ctx.settings.clone())).await;
    let mut browser = Browser::new();
    browser.login(&app, "admin@example.com", PASSWORD).await;

    let page = browser.get(&app, "/admin/users").await;
    assert!(page.body.contains("owner@example.com"));
    assert!(page.body.contains("<td>2</td>"));
    assert!(page.body.contains("return confirm("));

    let page = browser.get(&app, &format!("/admin/users/{}", owner.id)).await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("Write report"));
    assert!(page.body.contains("Review budget"));

    // Deleting the user takes their tasks along.
    browser
        .delete(&app, "/admin/users", &format!("/admin/users/{}", owner.id))
        .await;
    let summaries = ctx.store.list_users().await.unwrap();
    assert_eq!(summaries.len(), 1);
    assert!(ctx
        .store
        .list_tasks(owner.id, &Default::default())
        .await
        .unwrap()
        .is_empty());
}

#[test_log::test(actix_rt::test)]
async fn test_admin_missing_user_is_not_found() {
    let ctx = TestContext::new();
    ctx.create_user("admin", "admin@example.com", true).await;
    let app = test::init_service(build_app(ctx.state.clone(), ctx.settings.clone())).await;
    let mut browser = Browser::new();
    browser.login(&app, "admin@example.com", PASSWORD).await;

    assert_eq!(
        browser.get(&app, "/admin/users/4242").await.status,
        StatusCode::NOT_FOUND
    );
    let page = browser
        .delete(&app, "/admin/users", "/admin/users/4242")
        .await;
    assert_eq!(page.status, StatusCode::NOT_FOUND);
}
